//! In-process editor model: the host side of every editing operation.
//!
//! An [`Editor`] bundles what the Vim layer needs from an IDE editor:
//! * a document ([`Buffer`]) with char offsets, markers and guarded blocks,
//! * a primary caret plus optional secondary carets and a column-selection
//!   flag (only consulted by guards that refuse to run with several carets),
//! * the visual selection, kept as an anchor offset with the caret as head,
//! * per-editor Vim session state, the register store and the undo history.
//!
//! Undo recording:
//! * [`Editor::execute_command`] groups everything done by its closure into
//!   one named undo record. The net text change is stored as the record's
//!   first action; nested calls join the outer record.
//! * [`Editor::mark_vim_undoable`] leaves the sentinel marker. Outside a
//!   command it becomes its own record, which the undo walker skips.
//! * [`Editor::execute_compound`] brackets a command with start/finish marks
//!   so it undoes as one unit regardless of its name.
//! * [`Editor::type_text`] records each insert-mode burst as `Typing`.
//!
//! The editor implements [`UndoLedger`], so the undo walker can inspect and
//! step the history without knowing how it is stored.

pub mod motion;

pub use motion::{Motion, resolve_motion};

use anyhow::Result;
use core_config::IndentConfig;
use core_state::{
    ColumnSpan, CommandRecord, EditorSession, LastColumn, LedgerError, Mode, RegisterStore,
    SelectionType, SubMode, UndoAction, UndoDirection, UndoHistory, UndoLedger, VisualChange,
};
use core_text::{Buffer, INDENT_CHARS, LogicalPosition, TextError, TextRange};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorSettings {
    /// Single-line input field (no line-wise puts).
    pub one_line_mode: bool,
    pub viewer: bool,
    pub read_only: bool,
    pub indent: IndentConfig,
}

/// Rectangle covered by a block-wise range; `right` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBounds {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

#[derive(Debug)]
pub struct Editor {
    buffer: Buffer,
    caret: usize,
    secondary_carets: Vec<usize>,
    column_mode: bool,
    visual_anchor: Option<usize>,
    pub settings: EditorSettings,
    pub session: EditorSession,
    pub registers: RegisterStore,
    history: UndoHistory,
    command_depth: usize,
    change_marks: Option<TextRange>,
    last_pasted_region: Option<TextRange>,
}

impl Editor {
    pub fn new(name: &str, text: &str) -> Result<Self> {
        Self::with_settings(name, text, EditorSettings::default())
    }

    pub fn with_settings(name: &str, text: &str, settings: EditorSettings) -> Result<Self> {
        Ok(Self {
            buffer: Buffer::from_str(name, text)?,
            caret: 0,
            secondary_carets: Vec::new(),
            column_mode: false,
            visual_anchor: None,
            settings,
            session: EditorSession::new(),
            registers: RegisterStore::new(),
            history: UndoHistory::new(),
            command_depth: 0,
            change_marks: None,
            last_pasted_region: None,
        })
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    pub fn indent(&self) -> IndentConfig {
        self.settings.indent
    }

    pub fn is_one_line_mode(&self) -> bool {
        self.settings.one_line_mode
    }

    /// False for viewers and read-only documents.
    pub fn is_writable(&self) -> bool {
        !self.settings.viewer && !self.settings.read_only
    }

    // ----- carets ---------------------------------------------------------

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn caret_position(&self) -> LogicalPosition {
        self.buffer.offset_to_position(self.caret)
    }

    pub fn caret_line(&self) -> usize {
        self.buffer.line_number(self.caret)
    }

    /// Move the primary caret, clamped to the document.
    pub fn move_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.buffer.len_chars());
        trace!(target: "model.editor", caret = self.caret, "move_caret");
    }

    pub fn add_caret(&mut self, offset: usize) {
        self.secondary_carets
            .push(offset.min(self.buffer.len_chars()));
    }

    pub fn remove_secondary_carets(&mut self) {
        self.secondary_carets.clear();
    }

    pub fn caret_count(&self) -> usize {
        1 + self.secondary_carets.len()
    }

    pub fn set_column_mode(&mut self, on: bool) {
        self.column_mode = on;
    }

    pub fn is_column_mode(&self) -> bool {
        self.column_mode
    }

    // ----- lines ----------------------------------------------------------

    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.buffer.line_start_offset(line)
    }

    /// End of `line`, before its line break.
    pub fn line_end(&self, line: usize) -> usize {
        self.buffer.line_end_offset(line)
    }

    pub fn line_len(&self, line: usize) -> usize {
        self.buffer.line_len(line)
    }

    pub fn line_end_for_offset(&self, offset: usize) -> usize {
        self.buffer.line_end_for_offset(offset)
    }

    /// First non-blank offset at or after `offset` on the same run of indent.
    pub fn first_non_blank(&self, offset: usize) -> usize {
        self.buffer.shift_forward(offset, INDENT_CHARS)
    }

    pub fn position(&self, offset: usize) -> LogicalPosition {
        self.buffer.offset_to_position(offset)
    }

    pub fn offset(&self, pos: LogicalPosition) -> usize {
        self.buffer.position_to_offset(pos)
    }

    /// Whitespace needed to extend `line` up to column `to`. Empty lines get a
    /// tab-aware fill; a gap after existing text is filled with spaces.
    pub fn pad(&self, line: usize, to: usize) -> String {
        let len = self.buffer.line_len(line);
        if len >= to {
            return String::new();
        }
        if len == 0 {
            self.settings.indent.fill(to)
        } else {
            " ".repeat(to - len)
        }
    }

    // ----- text edits -----------------------------------------------------

    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), TextError> {
        self.buffer.insert_str(offset, text)?;
        debug!(target: "model.editor", offset, len = text.chars().count(), "insert_text");
        Ok(())
    }

    pub fn delete_text(&mut self, range: TextRange) -> Result<String, TextError> {
        let removed = self.buffer.delete(range)?;
        debug!(target: "model.editor", range = %range, "delete_text");
        if self.caret > self.buffer.len_chars() {
            self.caret = self.buffer.len_chars();
        }
        Ok(removed)
    }

    /// Rectangle spanned by a block-wise range.
    pub fn block_bounds(&self, range: TextRange) -> BlockBounds {
        let a = self.position(range.start());
        let b = self.position(range.end());
        BlockBounds {
            top: a.line.min(b.line),
            bottom: a.line.max(b.line),
            left: a.column.min(b.column),
            right: a.column.max(b.column),
        }
    }

    /// Per-line ranges of a block, clamped to each line, bottom row first so
    /// callers can delete them in order without shifting later rows.
    pub fn block_rows(&self, range: TextRange) -> Vec<TextRange> {
        let b = self.block_bounds(range);
        (b.top..=b.bottom)
            .rev()
            .map(|line| {
                TextRange::new(
                    self.offset(LogicalPosition::new(line, b.left)),
                    self.offset(LogicalPosition::new(line, b.right)),
                )
            })
            .collect()
    }

    /// Text covered by `range` as a register would store it.
    pub fn range_text(&self, range: TextRange, selection_type: SelectionType) -> String {
        match selection_type {
            SelectionType::BlockWise => {
                let mut rows: Vec<String> = self
                    .block_rows(range)
                    .into_iter()
                    .map(|r| self.buffer.slice(r))
                    .collect();
                rows.reverse();
                rows.join("\n")
            }
            _ => self.buffer.slice(range),
        }
    }

    // ----- marks ----------------------------------------------------------

    pub fn set_change_marks(&mut self, range: TextRange) {
        trace!(target: "model.editor", range = %range, "set_change_marks");
        self.change_marks = Some(range);
    }

    pub fn change_marks(&self) -> Option<TextRange> {
        self.change_marks
    }

    pub fn set_last_pasted_region(&mut self, range: TextRange) {
        self.last_pasted_region = Some(range);
    }

    pub fn last_pasted_region(&self) -> Option<TextRange> {
        self.last_pasted_region
    }

    // ----- visual mode ----------------------------------------------------

    pub fn visual_anchor(&self) -> Option<usize> {
        self.visual_anchor
    }

    pub fn has_selection(&self) -> bool {
        self.visual_anchor.is_some()
    }

    /// Enter visual mode with `sub_mode`, switch flavor, or leave it when the
    /// same flavor is toggled again.
    pub fn toggle_visual(&mut self, sub_mode: SubMode) {
        if self.session.in_visual() {
            if self.session.sub_mode() == sub_mode {
                self.exit_visual();
            } else {
                self.session.set_sub_mode(sub_mode);
                debug!(target: "model.editor", ?sub_mode, "visual_sub_mode_switched");
            }
            return;
        }
        self.visual_anchor = Some(self.caret);
        self.session.push_mode(Mode::Visual, sub_mode);
        debug!(target: "model.editor", ?sub_mode, anchor = self.caret, "visual_entered");
    }

    /// Select `[anchor, head]` in visual mode (head is where the caret lands).
    pub fn set_visual_selection(&mut self, sub_mode: SubMode, anchor: usize, head: usize) {
        if !self.session.in_visual() {
            self.session.push_mode(Mode::Visual, sub_mode);
        } else {
            self.session.set_sub_mode(sub_mode);
        }
        let len = self.buffer.len_chars();
        self.visual_anchor = Some(anchor.min(len));
        self.caret = head.min(len);
    }

    pub fn exit_visual(&mut self) {
        if self.session.in_visual() {
            self.session.pop_mode();
        }
        if self.visual_anchor.take().is_some() {
            debug!(target: "model.editor", caret = self.caret, "visual_exited");
        }
    }

    /// Drop the selection without leaving visual mode.
    pub fn remove_selection(&mut self) {
        self.visual_anchor = None;
    }

    /// Normalized selection `[start, end]` (end inclusive), if any.
    pub fn selection_bounds(&self) -> Option<(usize, usize)> {
        let anchor = self.visual_anchor?;
        Some((anchor.min(self.caret), anchor.max(self.caret)))
    }

    /// Range of the active visual selection with the selection type its
    /// sub-mode implies.
    pub fn visual_range(&self) -> Option<(TextRange, SelectionType)> {
        let (start, end) = self.selection_bounds()?;
        let len = self.buffer.len_chars();
        let sub_mode = self.session.sub_mode();
        let range = match sub_mode {
            SubMode::VisualLine => {
                let first = self.buffer.line_number(start);
                let last = self.buffer.line_number(end);
                TextRange::new(self.line_start(first), (self.line_end(last) + 1).min(len))
            }
            SubMode::VisualBlock => {
                let anchor = self.position(self.visual_anchor.unwrap_or(start));
                let head = self.position(self.caret);
                let top = anchor.line.min(head.line);
                let bottom = anchor.line.max(head.line);
                let left = anchor.column.min(head.column);
                let block_end = match self.session.last_column() {
                    LastColumn::LineEnd => self.line_end(bottom),
                    LastColumn::Column(_) => {
                        let right = anchor.column.max(head.column) + 1;
                        self.offset(LogicalPosition::new(bottom, right))
                    }
                };
                TextRange::new(self.offset(LogicalPosition::new(top, left)), block_end)
            }
            SubMode::None | SubMode::VisualChar => TextRange::new(start, (end + 1).min(len)),
        };
        Some((range, SelectionType::from_sub_mode(sub_mode)))
    }

    /// Shape of the current selection, remembered for dot-repeat.
    pub fn visual_operator_range(&self, force_linewise: bool) -> VisualChange {
        let (start, end) = self.selection_bounds().unwrap_or((self.caret, self.caret));
        let sp = self.position(start);
        let ep = self.position(end);
        let lines = ep.line - sp.line + 1;
        let sub_mode = self.session.sub_mode();
        if sub_mode == SubMode::VisualLine || force_linewise {
            return VisualChange::new(lines, ColumnSpan::Count(ep.column), SubMode::VisualLine);
        }
        if sub_mode == SubMode::VisualBlock {
            let columns = match self.session.last_column() {
                LastColumn::LineEnd => ColumnSpan::ToLineEnd,
                LastColumn::Column(_) => {
                    let anchor = self.position(self.visual_anchor.unwrap_or(start));
                    let head = self.position(self.caret);
                    ColumnSpan::Count(anchor.column.abs_diff(head.column) + 1)
                }
            };
            return VisualChange::new(lines, columns, SubMode::VisualBlock);
        }
        let chars = if lines > 1 {
            ep.column
        } else {
            ep.column - sp.column + 1
        };
        VisualChange::new(lines, ColumnSpan::Count(chars), SubMode::VisualChar)
    }

    /// Re-create a selection with the shape of `change`, anchored at the caret.
    pub fn reselect_visual_change(&mut self, change: VisualChange) {
        let anchor = self.caret;
        let start = self.position(anchor);
        let last_line = (start.line + change.lines.saturating_sub(1))
            .min(self.line_count().saturating_sub(1));
        let head = match (change.sub_mode, change.columns) {
            (SubMode::VisualLine, _) => self.line_start(last_line),
            (_, ColumnSpan::ToLineEnd) => self.line_end(last_line).saturating_sub(1).max(self.line_start(last_line)),
            (SubMode::VisualBlock, ColumnSpan::Count(n)) => {
                self.offset(LogicalPosition::new(last_line, start.column + n.saturating_sub(1)))
            }
            (_, ColumnSpan::Count(n)) if change.lines > 1 => {
                self.offset(LogicalPosition::new(last_line, n))
            }
            (_, ColumnSpan::Count(n)) => {
                let line_last = self.line_end(start.line).saturating_sub(1).max(anchor);
                (anchor + n.saturating_sub(1)).min(line_last)
            }
        };
        debug!(target: "model.editor", ?change, anchor, head, "reselect_visual_change");
        self.set_visual_selection(change.sub_mode, anchor, head);
    }

    /// Leave any mode for plain Normal mode, as an `<Esc>` keystroke would.
    pub fn escape(&mut self) {
        if self.session.mode() == Mode::Insert {
            let line_start = self.line_start(self.caret_line());
            if self.caret > line_start {
                self.caret -= 1;
            }
        }
        self.visual_anchor = None;
        self.session.reset_to_normal();
    }

    // ----- undo recording -------------------------------------------------

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Run `f` as one named undo command. Nested calls join the outer command.
    pub fn execute_command<R>(&mut self, name: &str, f: impl FnOnce(&mut Editor) -> R) -> R {
        if self.command_depth > 0 {
            return f(self);
        }
        self.history.begin_command(name);
        let before = self.buffer.snapshot();
        let caret_before = self.caret;
        self.command_depth += 1;
        let out = f(self);
        self.command_depth -= 1;
        let edit = (!self.buffer.same_text(&before)).then(|| UndoAction::Document {
            before,
            after: self.buffer.snapshot(),
            caret_before,
            caret_after: self.caret,
        });
        self.history.finish_command(edit);
        out
    }

    /// Like [`Editor::execute_command`], bracketed by start/finish marks.
    pub fn execute_compound<R>(&mut self, name: &str, f: impl FnOnce(&mut Editor) -> R) -> R {
        self.execute_command(name, |ed| {
            ed.history.add_action(UndoAction::StartMark { name: name.into() });
            let out = f(ed);
            ed.history.add_action(UndoAction::FinishMark { name: name.into() });
            out
        })
    }

    /// Leave the internal sentinel marker in the undo history.
    pub fn mark_vim_undoable(&mut self, name: &str) {
        trace!(target: "model.editor", name, "mark_vim_undoable");
        self.history.add_action(UndoAction::VimMarker { name: name.into() });
    }

    /// Insert-mode typing at the caret, recorded as a `Typing` command.
    pub fn type_text(&mut self, text: &str) -> Result<(), TextError> {
        if self.session.mode() != Mode::Insert {
            self.session.set_mode(Mode::Insert);
        }
        self.execute_command("Typing", |ed| {
            let at = ed.caret;
            ed.insert_text(at, text)?;
            ed.caret = at + text.chars().count();
            Ok(())
        })
    }
}

impl UndoLedger for Editor {
    fn is_available(&self, direction: UndoDirection) -> bool {
        !self.history.stack(direction).is_empty()
    }

    fn last_record(
        &self,
        direction: UndoDirection,
    ) -> Result<Option<&CommandRecord>, LedgerError> {
        self.history.last_record(direction)
    }

    fn depth(&self, direction: UndoDirection) -> Result<usize, LedgerError> {
        self.history.depth(direction)
    }

    fn step(&mut self, direction: UndoDirection) -> Result<bool, LedgerError> {
        let stepped = self
            .history
            .step(direction, &mut self.buffer, &mut self.caret)?;
        if stepped {
            self.visual_anchor = None;
            self.caret = self.caret.min(self.buffer.len_chars());
        }
        Ok(stepped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor(text: &str) -> Editor {
        Editor::new("test", text).unwrap()
    }

    #[test]
    fn char_visual_range_is_inclusive_of_head() {
        let mut ed = editor("hello world");
        ed.set_visual_selection(SubMode::VisualChar, 8, 2);
        let (range, ty) = ed.visual_range().unwrap();
        assert_eq!(range, TextRange::new(2, 9));
        assert_eq!(ty, SelectionType::CharacterWise);
    }

    #[test]
    fn line_visual_range_includes_trailing_break() {
        let mut ed = editor("one\ntwo\nthree");
        ed.set_visual_selection(SubMode::VisualLine, 5, 1);
        assert_eq!(ed.visual_range().unwrap().0, TextRange::new(0, 8));
        ed.set_visual_selection(SubMode::VisualLine, 9, 9);
        assert_eq!(ed.visual_range().unwrap().0, TextRange::new(8, 13));
    }

    #[test]
    fn block_rows_and_text() {
        let mut ed = editor("abcd\nefgh\nijkl");
        ed.set_visual_selection(SubMode::VisualBlock, 1, 12);
        let (range, ty) = ed.visual_range().unwrap();
        assert_eq!(ty, SelectionType::BlockWise);
        assert_eq!(ed.range_text(range, ty), "bc\nfg\njk");
        let b = ed.block_bounds(range);
        assert_eq!((b.top, b.bottom, b.left, b.right), (0, 2, 1, 3));
    }

    #[test]
    fn visual_change_round_trips_through_reselect() {
        let mut ed = editor("abcdef\nghijkl\nmnopqr");
        ed.set_visual_selection(SubMode::VisualBlock, 1, 10);
        let change = ed.visual_operator_range(false);
        assert_eq!(
            change,
            VisualChange::new(2, ColumnSpan::Count(3), SubMode::VisualBlock)
        );
        ed.exit_visual();
        ed.move_caret(8);
        ed.reselect_visual_change(change);
        assert_eq!(ed.selection_bounds(), Some((8, 17)));
        assert_eq!(ed.session.sub_mode(), SubMode::VisualBlock);
    }

    #[test]
    fn toggle_same_sub_mode_exits() {
        let mut ed = editor("abc");
        ed.toggle_visual(SubMode::VisualChar);
        assert!(ed.session.in_visual());
        ed.toggle_visual(SubMode::VisualLine);
        assert_eq!(ed.session.sub_mode(), SubMode::VisualLine);
        ed.toggle_visual(SubMode::VisualLine);
        assert_eq!(ed.session.mode(), Mode::Normal);
        assert!(!ed.has_selection());
    }

    #[test]
    fn commands_record_one_undo_entry() {
        let mut ed = editor("abc");
        ed.execute_command("Put", |ed| {
            ed.mark_vim_undoable("Vim Put");
            ed.insert_text(0, "x").unwrap();
            ed.execute_command("Inner", |ed| ed.insert_text(1, "y").unwrap());
        });
        assert_eq!(ed.history().undo_depth(), 1);
        let rec = ed.last_record(UndoDirection::Undo).unwrap().unwrap();
        assert_eq!(rec.name, "Put");
        assert!(matches!(rec.actions[0], UndoAction::Document { .. }));
        assert!(ed.step(UndoDirection::Undo).unwrap());
        assert_eq!(ed.text(), "abc");
    }

    #[test]
    fn sentinel_outside_command_is_its_own_record() {
        let mut ed = editor("abc");
        ed.mark_vim_undoable("Vim Motion");
        let rec = ed.last_record(UndoDirection::Undo).unwrap().unwrap();
        assert!(rec.name.is_empty());
        assert!(rec.actions[0].is_vim_marker());
    }

    #[test]
    fn typing_then_escape_returns_to_normal() {
        let mut ed = editor("");
        ed.type_text("hi").unwrap();
        assert_eq!(ed.session.mode(), Mode::Insert);
        assert_eq!(ed.caret(), 2);
        ed.escape();
        assert_eq!(ed.session.mode(), Mode::Normal);
        assert_eq!(ed.caret(), 1);
    }

    #[test]
    fn pad_fills_gap_to_column() {
        let ed = editor("ab\n\ncd");
        assert_eq!(ed.pad(0, 5), "   ");
        assert_eq!(ed.pad(1, 2), "  ");
        assert_eq!(ed.pad(2, 1), "");
    }
}
