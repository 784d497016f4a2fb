//! Visual operators.
//!
//! Every operator invoked from a visual mode runs inside the same bracket:
//! [`VisualStartFinish::start`] computes the operator range from the
//! selection (re-creating the previous selection shape when dot-repeating)
//! and applies the command flag side effects; [`VisualStartFinish::finish`]
//! restores the sub-mode, leaves visual mode unless the command expects more
//! keys, and records the change for dot-repeat when the operator succeeded.
//! [`VisualOperatorHandler::execute`] guarantees `finish` runs exactly once
//! for every `start`.

use core_model::Editor;
use core_state::{
    ColumnSpan, LastChange, LastColumn, Mode, SelectionType, SubMode, VisualChange,
};
use core_text::TextRange;
use tracing::{debug, trace};

use crate::host::Services;
use crate::{ActionError, Command, CommandFlags, change, copy};

pub struct VisualStartFinish<'c> {
    cmd: &'c Command,
    was_repeat: bool,
    last_column: LastColumn,
    /// Sub-mode to restore when `start` forced VisualLine.
    forced_from: Option<SubMode>,
    selection_type: SelectionType,
    change: Option<VisualChange>,
    res: bool,
    finished: bool,
}

impl<'c> VisualStartFinish<'c> {
    pub fn new(cmd: &'c Command) -> Self {
        Self {
            cmd,
            was_repeat: false,
            last_column: LastColumn::default(),
            forced_from: None,
            selection_type: SelectionType::CharacterWise,
            change: None,
            res: false,
            finished: false,
        }
    }

    /// Range the operator acts on, `None` when no selection exists.
    pub fn start(&mut self, ed: &mut Editor) -> Option<TextRange> {
        if ed.session.mode() == Mode::Repeat {
            self.was_repeat = true;
            self.last_column = ed.session.last_column();
            if let Some(change) = ed.session.last_visual_change() {
                ed.reselect_visual_change(change);
                if change.columns == ColumnSpan::ToLineEnd {
                    ed.session.set_last_column(LastColumn::LineEnd);
                }
            }
        }

        let sub_mode = ed.session.sub_mode();
        let range = if ed.session.mode() == Mode::Visual {
            if !self.was_repeat {
                self.change = Some(ed.visual_operator_range(self.cmd.has(CommandFlags::MOT_LINEWISE)));
            }
            ed.visual_range().map(|(range, ty)| {
                self.selection_type = ty;
                range
            })
        } else {
            None
        };
        trace!(target: "actions.visual", cmd = %self.cmd.name, ?sub_mode, ?range, repeat = self.was_repeat, "visual_start");

        if self.cmd.has(CommandFlags::MULTIKEY_UNDO) {
            ed.exit_visual();
        } else if self.cmd.has(CommandFlags::FORCE_LINEWISE) && sub_mode != SubMode::VisualLine {
            self.forced_from = Some(sub_mode);
            ed.session.set_sub_mode(SubMode::VisualLine);
            self.selection_type = SelectionType::LineWise;
            return range.map(|r| whole_lines(ed, r));
        }
        range
    }

    /// Selection type the operator should apply to the range.
    pub fn selection_type(&self) -> SelectionType {
        self.selection_type
    }

    pub fn set_res(&mut self, res: bool) {
        self.res = res;
    }

    pub fn finish(&mut self, ed: &mut Editor) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Some(sub_mode) = self.forced_from.take()
            && ed.session.in_visual()
        {
            ed.session.set_sub_mode(sub_mode);
        }
        if !self.cmd.has(CommandFlags::MULTIKEY_UNDO) && !self.cmd.has(CommandFlags::EXPECT_MORE) {
            ed.exit_visual();
            if self.was_repeat {
                ed.session.set_last_column(self.last_column);
            }
        }
        if self.res {
            if let Some(change) = self.change {
                ed.session.set_last_visual_change(change);
            }
            ed.session.save_last_change(LastChange {
                name: self.cmd.name.clone(),
                count: self.cmd.count,
            });
        }
        debug!(target: "actions.visual", cmd = %self.cmd.name, res = self.res, "visual_finish");
    }
}

fn whole_lines(ed: &Editor, range: TextRange) -> TextRange {
    let r = range.normalize();
    let first = ed.buffer().line_number(r.start());
    let last = ed.buffer().line_number(r.end().saturating_sub(1).max(r.start()));
    TextRange::new(
        ed.line_start(first),
        (ed.line_end(last) + 1).min(ed.len_chars()),
    )
}

pub trait VisualOperatorHandler {
    fn name(&self) -> &'static str;

    fn execute_range(
        &self,
        ed: &mut Editor,
        services: &Services,
        cmd: &Command,
        range: TextRange,
        selection_type: SelectionType,
    ) -> Result<bool, ActionError>;

    /// Run the operator over the current selection.
    ///
    /// # Panics
    /// When called without a visual selection.
    fn execute(&self, ed: &mut Editor, services: &Services, cmd: &Command) -> Result<bool, ActionError> {
        let mut runnable = VisualStartFinish::new(cmd);
        let Some(range) = runnable.start(ed) else {
            runnable.finish(ed);
            panic!("visual operator {} started without a selection", self.name());
        };
        let selection_type = runnable.selection_type();
        let result = self.execute_range(ed, services, cmd, range, selection_type);
        runnable.set_res(matches!(result, Ok(true)));
        runnable.finish(ed);
        result
    }
}

pub struct VisualYank;

impl VisualOperatorHandler for VisualYank {
    fn name(&self) -> &'static str {
        "Vim Visual Yank"
    }

    fn execute_range(
        &self,
        ed: &mut Editor,
        _services: &Services,
        _cmd: &Command,
        range: TextRange,
        selection_type: SelectionType,
    ) -> Result<bool, ActionError> {
        Ok(copy::yank_range(ed, Some(range), selection_type, true))
    }
}

pub struct VisualDelete;

impl VisualOperatorHandler for VisualDelete {
    fn name(&self) -> &'static str {
        "Vim Visual Delete"
    }

    fn execute_range(
        &self,
        ed: &mut Editor,
        _services: &Services,
        _cmd: &Command,
        range: TextRange,
        selection_type: SelectionType,
    ) -> Result<bool, ActionError> {
        change::delete_range(ed, range, selection_type, true)
    }
}

/// Delete into the black hole. Outside visual mode it deletes `count`
/// characters at the caret instead.
pub struct VisualDeleteWithoutCopy;

impl VisualDeleteWithoutCopy {
    pub fn run(&self, ed: &mut Editor, services: &Services, cmd: &Command) -> Result<bool, ActionError> {
        if !ed.session.in_visual() || !ed.has_selection() {
            return change::delete_character(ed, cmd.count, false);
        }
        self.execute(ed, services, cmd)
    }
}

impl VisualOperatorHandler for VisualDeleteWithoutCopy {
    fn name(&self) -> &'static str {
        "Vim Visual Delete Without Copy"
    }

    fn execute_range(
        &self,
        ed: &mut Editor,
        _services: &Services,
        _cmd: &Command,
        range: TextRange,
        selection_type: SelectionType,
    ) -> Result<bool, ActionError> {
        change::delete_range(ed, range, selection_type, false)
    }
}

/// Replace the selection with the selected register.
pub struct VisualPut {
    pub cursor_after: bool,
}

impl VisualOperatorHandler for VisualPut {
    fn name(&self) -> &'static str {
        "Vim Visual Put"
    }

    fn execute_range(
        &self,
        ed: &mut Editor,
        services: &Services,
        cmd: &Command,
        range: TextRange,
        _selection_type: SelectionType,
    ) -> Result<bool, ActionError> {
        copy::put_visual_range(ed, services, range, cmd.count, true, self.cursor_after)
    }
}

/// `gq`: reformat the selected lines.
pub struct VisualReformat;

impl VisualOperatorHandler for VisualReformat {
    fn name(&self) -> &'static str {
        "Vim Visual Reformat"
    }

    fn execute_range(
        &self,
        ed: &mut Editor,
        services: &Services,
        _cmd: &Command,
        range: TextRange,
        _selection_type: SelectionType,
    ) -> Result<bool, ActionError> {
        services.formatter.reformat_range(ed, range)?;
        let line = ed.buffer().line_number(range.normalize().start());
        let at = ed.first_non_blank(ed.line_start(line));
        ed.move_caret(at);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor(text: &str) -> Editor {
        Editor::new("visual", text).unwrap()
    }

    #[test]
    fn start_computes_range_and_finish_leaves_visual() {
        let mut ed = editor("hello world");
        ed.set_visual_selection(SubMode::VisualChar, 0, 4);
        let cmd = Command::new("Vim Visual Yank", 1, CommandFlags::empty());
        let mut vsf = VisualStartFinish::new(&cmd);
        assert_eq!(vsf.start(&mut ed), Some(TextRange::new(0, 5)));
        assert!(ed.session.in_visual());
        vsf.set_res(true);
        vsf.finish(&mut ed);
        assert_eq!(ed.session.mode(), Mode::Normal);
        assert_eq!(
            ed.session.last_visual_change(),
            Some(VisualChange::new(1, ColumnSpan::Count(5), SubMode::VisualChar))
        );
        assert_eq!(ed.session.last_change().unwrap().name, "Vim Visual Yank");
    }

    #[test]
    fn force_linewise_switches_and_restores_sub_mode() {
        let mut ed = editor("ab\ncd\nef");
        ed.set_visual_selection(SubMode::VisualChar, 1, 4);
        let cmd = Command::new(
            "Vim Visual Yank Line",
            1,
            CommandFlags::FORCE_LINEWISE | CommandFlags::EXPECT_MORE,
        );
        let mut vsf = VisualStartFinish::new(&cmd);
        assert_eq!(vsf.start(&mut ed), Some(TextRange::new(0, 6)));
        assert_eq!(ed.session.sub_mode(), SubMode::VisualLine);
        assert_eq!(vsf.selection_type(), SelectionType::LineWise);
        vsf.finish(&mut ed);
        // EXPECT_MORE keeps visual mode alive, with the original flavor back
        assert!(ed.session.in_visual());
        assert_eq!(ed.session.sub_mode(), SubMode::VisualChar);
    }

    #[test]
    fn multikey_undo_exits_before_operator() {
        let mut ed = editor("abc");
        ed.set_visual_selection(SubMode::VisualChar, 0, 1);
        let cmd = Command::new("Vim Change", 1, CommandFlags::MULTIKEY_UNDO);
        let mut vsf = VisualStartFinish::new(&cmd);
        assert_eq!(vsf.start(&mut ed), Some(TextRange::new(0, 2)));
        assert!(!ed.session.in_visual());
        vsf.finish(&mut ed);
        assert!(ed.session.last_change().is_none());
    }

    #[test]
    fn failed_operator_records_no_change() {
        let mut ed = editor("abc");
        ed.set_visual_selection(SubMode::VisualChar, 0, 1);
        let cmd = Command::new("Vim Visual Put", 1, CommandFlags::empty());
        // empty registers: the put fails
        assert!(!VisualPut { cursor_after: false }
            .execute(&mut ed, &Services::default(), &cmd)
            .unwrap());
        assert_eq!(ed.session.mode(), Mode::Normal);
        assert!(ed.session.last_visual_change().is_none());
    }
}
