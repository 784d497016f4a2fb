//! Command-grouped undo history and the ledger seam the undo walker reads.
//!
//! Every editing command opens a record (`begin_command`), collects actions
//! while it runs, and is closed with `finish_command`. A record can hold:
//! - document edits (before/after snapshots of the whole text plus carets),
//! - the Vim sentinel marker, left behind by internal editing primitives,
//! - start/finish marks bracketing a compound session (template, rename).
//!
//! The history itself knows nothing about Vim; classification of records
//! happens in the undo walker, which only sees the [`UndoLedger`] trait.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;

use core_text::{Buffer, TextSnapshot};
use thiserror::Error;
use tracing::trace;

/// Maximum number of records retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoDirection {
    Undo,
    Redo,
}

impl fmt::Display for UndoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoDirection::Undo => f.write_str("undo"),
            UndoDirection::Redo => f.write_str("redo"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{direction} stack cannot be inspected while a command is being recorded")]
    StackUnavailable { direction: UndoDirection },
}

#[derive(Debug, Clone)]
pub enum UndoAction {
    Document {
        before: TextSnapshot,
        after: TextSnapshot,
        caret_before: usize,
        caret_after: usize,
    },
    /// Sentinel left by internal Vim primitives.
    VimMarker { name: String },
    StartMark { name: String },
    FinishMark { name: String },
}

impl UndoAction {
    pub fn is_vim_marker(&self) -> bool {
        matches!(self, UndoAction::VimMarker { .. })
    }

    pub fn is_session_mark(&self) -> bool {
        matches!(
            self,
            UndoAction::StartMark { .. } | UndoAction::FinishMark { .. }
        )
    }
}

/// One entry of the undo or redo stack.
#[derive(Debug, Clone, Default)]
pub struct CommandRecord {
    pub name: String,
    pub actions: Vec<UndoAction>,
}

impl CommandRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: UndoAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// Read/step access to an undo stack, as needed by the undo walker.
///
/// `depth` and `last_record` fail while the owner cannot expose a consistent
/// view of its stacks; callers treat that as fatal for the invocation.
pub trait UndoLedger {
    fn is_available(&self, direction: UndoDirection) -> bool;

    /// Record that the next `step` in `direction` would revert or replay.
    fn last_record(&self, direction: UndoDirection)
    -> Result<Option<&CommandRecord>, LedgerError>;

    fn depth(&self, direction: UndoDirection) -> Result<usize, LedgerError>;

    /// Undo or redo one record. Returns false when nothing was available.
    fn step(&mut self, direction: UndoDirection) -> Result<bool, LedgerError>;
}

pub struct UndoHistory {
    undo_stack: Vec<CommandRecord>,
    redo_stack: Vec<CommandRecord>,
    open: Option<CommandRecord>,
    /// Document actions dropped because the text did not change.
    noop_edits_skipped: u64,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UndoHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHistory")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("open", &self.open.as_ref().map(|r| r.name.as_str()))
            .finish()
    }
}

impl UndoHistory {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: None,
            noop_edits_skipped: 0,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn noop_edits_skipped(&self) -> u64 {
        self.noop_edits_skipped
    }

    pub fn stack(&self, direction: UndoDirection) -> &[CommandRecord] {
        match direction {
            UndoDirection::Undo => &self.undo_stack,
            UndoDirection::Redo => &self.redo_stack,
        }
    }

    pub fn begin_command(&mut self, name: &str) {
        if self.open.is_none() {
            self.open = Some(CommandRecord::new(name));
            trace!(target: "state.undo", command = name, "begin_command");
        }
    }

    /// Append an action to the open command, or push it as its own unnamed
    /// record when no command is open.
    pub fn add_action(&mut self, action: UndoAction) {
        if self.skip_noop_edit(&action) {
            return;
        }
        match self.open.as_mut() {
            Some(rec) => rec.actions.push(action),
            None => self.push_record(CommandRecord::default().with_action(action)),
        }
    }

    fn skip_noop_edit(&mut self, action: &UndoAction) -> bool {
        if let UndoAction::Document { before, after, .. } = action
            && before.len_chars() == after.len_chars()
            && snapshot_hash(before) == snapshot_hash(after)
        {
            self.noop_edits_skipped += 1;
            trace!(target: "state.undo", "noop_edit_skipped");
            return true;
        }
        false
    }

    /// Close the open command. `edit` (the net document change of the whole
    /// command) becomes the first action of the record. Records without any
    /// action are dropped.
    pub fn finish_command(&mut self, edit: Option<UndoAction>) {
        let Some(mut rec) = self.open.take() else {
            return;
        };
        if let Some(edit) = edit
            && !self.skip_noop_edit(&edit)
        {
            rec.actions.insert(0, edit);
        }
        if rec.actions.is_empty() {
            trace!(target: "state.undo", command = %rec.name, "empty_command_dropped");
            return;
        }
        self.push_record(rec);
    }

    pub fn push_record(&mut self, rec: CommandRecord) {
        trace!(target: "state.undo", command = %rec.name, actions = rec.actions.len(), undo_depth = self.undo_stack.len() + 1, "push_record");
        self.undo_stack.push(rec);
        if self.undo_stack.len() > UNDO_HISTORY_MAX {
            self.undo_stack.remove(0);
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "state.undo", "redo_stack_cleared_on_new_edit");
        }
    }

    fn guard(&self, direction: UndoDirection) -> Result<(), LedgerError> {
        if self.open.is_some() {
            return Err(LedgerError::StackUnavailable { direction });
        }
        Ok(())
    }

    pub fn last_record(
        &self,
        direction: UndoDirection,
    ) -> Result<Option<&CommandRecord>, LedgerError> {
        self.guard(direction)?;
        Ok(self.stack(direction).last())
    }

    pub fn depth(&self, direction: UndoDirection) -> Result<usize, LedgerError> {
        self.guard(direction)?;
        Ok(self.stack(direction).len())
    }

    /// Revert (undo) or replay (redo) the top record against `buffer`,
    /// moving it to the opposite stack.
    pub fn step(
        &mut self,
        direction: UndoDirection,
        buffer: &mut Buffer,
        caret: &mut usize,
    ) -> Result<bool, LedgerError> {
        self.guard(direction)?;
        let (from, to) = match direction {
            UndoDirection::Undo => (&mut self.undo_stack, &mut self.redo_stack),
            UndoDirection::Redo => (&mut self.redo_stack, &mut self.undo_stack),
        };
        let Some(rec) = from.pop() else {
            return Ok(false);
        };
        let docs = rec.actions.iter().filter_map(|a| match a {
            UndoAction::Document {
                before,
                after,
                caret_before,
                caret_after,
            } => Some((before, after, *caret_before, *caret_after)),
            _ => None,
        });
        match direction {
            UndoDirection::Undo => {
                for (before, _, caret_before, _) in docs.rev() {
                    buffer.restore(before);
                    *caret = caret_before;
                }
            }
            UndoDirection::Redo => {
                for (_, after, _, caret_after) in docs {
                    buffer.restore(after);
                    *caret = caret_after;
                }
            }
        }
        let name = rec.name.clone();
        to.push(rec);
        trace!(target: "state.undo", %direction, command = %name, undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "step");
        Ok(true)
    }
}

fn snapshot_hash(snap: &TextSnapshot) -> u64 {
    let mut h = DefaultHasher::new();
    for chunk in snap.chunks() {
        h.write(chunk.as_bytes());
    }
    h.finish()
}
