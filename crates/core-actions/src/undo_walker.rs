//! Undo/redo over the editor's command history.
//!
//! The history interleaves three kinds of records with user edits: internal
//! sentinel records (selection and motion bookkeeping), compound commands,
//! and the many small records insert-mode typing produces. One `u` has to
//! feel like a Vim undo, so the walker
//! 1. steps over sentinel records without stopping,
//! 2. undoes a compound or non-mergeable command as exactly one step,
//! 3. merges a run of mergeable records (typing and friends) into one step.
//!
//! A step that fails to shrink the stack by one ends the walk, so a stuck
//! command can never spin the walker.

use core_config::UndoConfig;
use core_model::Editor;
use core_state::{CommandRecord, Mode, UndoDirection, UndoLedger};
use tracing::{debug, info, warn};

use crate::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    NoAction,
    /// Internal sentinel record, never a stopping point.
    VimAction,
    /// Undone as exactly one step.
    CommandAction,
    /// Mergeable with neighbouring records of the same kind.
    TypeAction,
}

pub fn classify(record: Option<&CommandRecord>, undo: &UndoConfig) -> RecordKind {
    let Some(record) = record else {
        return RecordKind::NoAction;
    };
    match record.actions.first() {
        None => return RecordKind::VimAction,
        Some(first) if first.is_vim_marker() => return RecordKind::VimAction,
        _ => {}
    }
    if record.actions.iter().any(|a| a.is_session_mark()) {
        return RecordKind::CommandAction;
    }
    if !record.name.is_empty() && !undo.is_mergeable(&record.name) {
        return RecordKind::CommandAction;
    }
    RecordKind::TypeAction
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Moved,
    /// The ledger had nothing to do.
    Refused,
    /// The ledger reported a step but the stack did not shrink by one.
    Stuck,
}

fn step_once<L: UndoLedger + ?Sized>(ledger: &mut L, direction: UndoDirection) -> Result<Step, ActionError> {
    let before = ledger.depth(direction)?;
    if !ledger.step(direction)? {
        return Ok(Step::Refused);
    }
    let after = ledger.depth(direction)?;
    if after + 1 != before {
        warn!(target: "actions.undo", %direction, before, after, "undo_step_stuck");
        return Ok(Step::Stuck);
    }
    Ok(Step::Moved)
}

/// Walk the ledger one user-visible step in `direction`. Returns whether
/// anything was undone (or redone).
pub fn walk<L: UndoLedger + ?Sized>(
    ledger: &mut L,
    direction: UndoDirection,
    undo: &UndoConfig,
) -> Result<bool, ActionError> {
    let mut stepped = false;

    let mut kind = classify(ledger.last_record(direction)?, undo);
    while kind == RecordKind::VimAction {
        match step_once(ledger, direction)? {
            Step::Moved => stepped = true,
            Step::Refused => return Ok(stepped),
            Step::Stuck => return Ok(true),
        }
        kind = classify(ledger.last_record(direction)?, undo);
    }

    match kind {
        RecordKind::NoAction | RecordKind::VimAction => {}
        RecordKind::CommandAction => {
            stepped |= step_once(ledger, direction)? != Step::Refused;
        }
        RecordKind::TypeAction => {
            let mut merged = 0usize;
            while matches!(kind, RecordKind::TypeAction | RecordKind::VimAction) {
                match step_once(ledger, direction)? {
                    Step::Moved => stepped = true,
                    Step::Refused => break,
                    Step::Stuck => {
                        stepped = true;
                        break;
                    }
                }
                merged += 1;
                kind = classify(ledger.last_record(direction)?, undo);
            }
            debug!(target: "actions.undo", %direction, merged, "typing_merged");
        }
    }
    Ok(stepped)
}

fn run(ed: &mut Editor, direction: UndoDirection, undo: &UndoConfig) -> Result<bool, ActionError> {
    let stepped = if ed.is_available(direction) {
        walk(ed, direction, undo)?
    } else {
        debug!(target: "actions.undo", %direction, "nothing_to_walk");
        false
    };
    if ed.session.mode() != Mode::Normal {
        info!(target: "actions.undo", %direction, mode = ?ed.session.mode(), "inject_escape");
        ed.escape();
    }
    Ok(stepped)
}

/// `u`
pub fn undo(ed: &mut Editor, undo: &UndoConfig) -> Result<bool, ActionError> {
    run(ed, UndoDirection::Undo, undo)
}

/// `<C-r>`
pub fn redo(ed: &mut Editor, undo: &UndoConfig) -> Result<bool, ActionError> {
    run(ed, UndoDirection::Redo, undo)
}
