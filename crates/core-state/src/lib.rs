//! Editor session state: modes, visual shapes, registers and undo history.
//!
//! Everything in this crate is per-editor state with the lifetime of the
//! editor that owns it. Nothing here touches the document directly except the
//! undo history, which restores text snapshots on undo/redo.
//!
//! Mode stack:
//! - `EditorSession` keeps a stack of `(Mode, SubMode)` pairs. Entering visual
//!   mode or replaying a change (dot-repeat) pushes; leaving pops back to
//!   whatever was active before. The bottom entry is always `Normal`.
//! - Visual operators read the sub-mode to decide how the selection maps to a
//!   range, and occasionally switch it temporarily (forced line-wise
//!   operators); the switch rewrites the top entry in place.
//!
//! Dot-repeat bookkeeping:
//! - `last_visual_change` is the shape of the last successful visual operator,
//!   used to re-create an equivalent selection at the caret when repeating.
//! - `last_column` is the remembered caret column; `LastColumn::LineEnd`
//!   corresponds to a `$`-extended selection.

pub mod line_ending;
pub mod registers;
pub mod undo;

pub use line_ending::{LineEnding, NormalizedText, normalize_line_endings};
pub use registers::{ClipboardError, ClipboardText, Register, RegisterStore, Transferable};
pub use undo::{
    CommandRecord, LedgerError, UNDO_HISTORY_MAX, UndoAction, UndoDirection, UndoHistory,
    UndoLedger,
};

use tracing::trace;

/// Current editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Vim "command" mode: navigation and operators.
    #[default]
    Normal,
    /// Insert text mode.
    Insert,
    /// A visual selection is active (see [`SubMode`] for its flavor).
    Visual,
    /// A previous change is being replayed (dot-repeat).
    Repeat,
    /// Ex command line entry.
    CommandLine,
}

/// Flavor of the active visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SubMode {
    #[default]
    None,
    VisualChar,
    VisualLine,
    VisualBlock,
}

/// Shape of a yanked/deleted/pasted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionType {
    CharacterWise,
    LineWise,
    BlockWise,
}

impl SelectionType {
    /// Selection type implied by a visual sub-mode.
    pub fn from_sub_mode(sub_mode: SubMode) -> Self {
        match sub_mode {
            SubMode::VisualLine => SelectionType::LineWise,
            SubMode::VisualBlock => SelectionType::BlockWise,
            SubMode::None | SubMode::VisualChar => SelectionType::CharacterWise,
        }
    }
}

/// Horizontal extent of a remembered visual operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSpan {
    Count(usize),
    /// The selection was extended to the end of every line (`$`).
    ToLineEnd,
}

/// Snapshot of the shape of a completed visual operation (for dot-repeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualChange {
    pub lines: usize,
    pub columns: ColumnSpan,
    pub sub_mode: SubMode,
}

impl VisualChange {
    pub fn new(lines: usize, columns: ColumnSpan, sub_mode: SubMode) -> Self {
        Self {
            lines,
            columns,
            sub_mode,
        }
    }
}

/// Remembered caret column used by vertical motions and repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastColumn {
    Column(usize),
    LineEnd,
}

impl Default for LastColumn {
    fn default() -> Self {
        LastColumn::Column(0)
    }
}

/// The last command recorded as "last change" for repeat purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastChange {
    pub name: String,
    pub count: usize,
}

/// Per-editor Vim session state.
#[derive(Debug, Clone)]
pub struct EditorSession {
    modes: Vec<(Mode, SubMode)>,
    last_column: LastColumn,
    last_visual_change: Option<VisualChange>,
    last_change: Option<LastChange>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            modes: vec![(Mode::Normal, SubMode::None)],
            last_column: LastColumn::default(),
            last_visual_change: None,
            last_change: None,
        }
    }

    fn top(&self) -> (Mode, SubMode) {
        self.modes
            .last()
            .copied()
            .unwrap_or((Mode::Normal, SubMode::None))
    }

    pub fn mode(&self) -> Mode {
        self.top().0
    }

    pub fn sub_mode(&self) -> SubMode {
        self.top().1
    }

    /// True while a visual selection is being edited (directly or during a repeat).
    pub fn in_visual(&self) -> bool {
        self.mode() == Mode::Visual
    }

    pub fn push_mode(&mut self, mode: Mode, sub_mode: SubMode) {
        self.modes.push((mode, sub_mode));
        trace!(target: "state.session", ?mode, ?sub_mode, depth = self.modes.len(), "push_mode");
    }

    /// Pop the current mode. The bottom `Normal` entry is never removed.
    pub fn pop_mode(&mut self) -> Mode {
        let popped = if self.modes.len() > 1 {
            self.modes.pop().map(|(m, _)| m).unwrap_or_default()
        } else {
            Mode::Normal
        };
        trace!(target: "state.session", ?popped, current = ?self.mode(), "pop_mode");
        popped
    }

    /// Rewrite the sub-mode of the current entry.
    pub fn set_sub_mode(&mut self, sub_mode: SubMode) {
        if let Some(top) = self.modes.last_mut() {
            top.1 = sub_mode;
        }
    }

    /// Replace the current mode in place (used for Normal <-> Insert toggles).
    pub fn set_mode(&mut self, mode: Mode) {
        if let Some(top) = self.modes.last_mut() {
            top.0 = mode;
            if mode != Mode::Visual {
                top.1 = SubMode::None;
            }
        }
    }

    /// Drop every pushed mode and return to plain Normal mode.
    pub fn reset_to_normal(&mut self) {
        self.modes.truncate(1);
        self.modes[0] = (Mode::Normal, SubMode::None);
    }

    pub fn last_column(&self) -> LastColumn {
        self.last_column
    }

    pub fn set_last_column(&mut self, column: LastColumn) {
        self.last_column = column;
    }

    pub fn last_visual_change(&self) -> Option<VisualChange> {
        self.last_visual_change
    }

    pub fn set_last_visual_change(&mut self, change: VisualChange) {
        self.last_visual_change = Some(change);
    }

    pub fn last_change(&self) -> Option<&LastChange> {
        self.last_change.as_ref()
    }

    pub fn save_last_change(&mut self, change: LastChange) {
        self.last_change = Some(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_stack_never_drops_normal() {
        let mut s = EditorSession::new();
        assert_eq!(s.pop_mode(), Mode::Normal);
        s.push_mode(Mode::Repeat, SubMode::None);
        s.push_mode(Mode::Visual, SubMode::VisualChar);
        assert!(s.in_visual());
        s.set_sub_mode(SubMode::VisualLine);
        assert_eq!(s.sub_mode(), SubMode::VisualLine);
        assert_eq!(s.pop_mode(), Mode::Visual);
        assert_eq!(s.mode(), Mode::Repeat);
        s.reset_to_normal();
        assert_eq!((s.mode(), s.sub_mode()), (Mode::Normal, SubMode::None));
    }

    #[test]
    fn selection_type_follows_sub_mode() {
        assert_eq!(
            SelectionType::from_sub_mode(SubMode::VisualLine),
            SelectionType::LineWise
        );
        assert_eq!(
            SelectionType::from_sub_mode(SubMode::VisualBlock),
            SelectionType::BlockWise
        );
        assert_eq!(
            SelectionType::from_sub_mode(SubMode::None),
            SelectionType::CharacterWise
        );
    }
}
