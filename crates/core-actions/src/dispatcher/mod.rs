//! Dispatcher applying `Action` to an [`Editor`].
//!
//! Every text-changing action runs inside [`Editor::execute_command`], so it
//! becomes one named record in the undo history. Undo itself cannot run while
//! a command is recording, which is why `u` is deferred: it is queued here and
//! only executed by [`Dispatcher::run_deferred`], after the current command
//! has closed. Redo runs immediately.
//!
//! The dispatcher also remembers the last successful visual operator so `.`
//! can replay it over a selection of the same shape at the caret.

use std::collections::VecDeque;

use core_model::Editor;
use core_state::{Mode, SubMode};
use core_text::TextSnapshot;
use tracing::{debug, trace};

use crate::host::Services;
use crate::visual::{
    VisualDelete, VisualDeleteWithoutCopy, VisualOperatorHandler, VisualPut, VisualReformat,
    VisualYank,
};
use crate::{ActionError, Argument, Command, copy, undo_walker};

/// Visual operators the dispatcher knows how to run and repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualOp {
    Yank,
    Delete,
    DeleteWithoutCopy,
    Put { cursor_after: bool },
    Reformat,
}

impl VisualOp {
    fn run(self, ed: &mut Editor, services: &Services, cmd: &Command) -> Result<bool, ActionError> {
        match self {
            VisualOp::Yank => VisualYank.execute(ed, services, cmd),
            VisualOp::Delete => VisualDelete.execute(ed, services, cmd),
            VisualOp::DeleteWithoutCopy => VisualDeleteWithoutCopy.run(ed, services, cmd),
            VisualOp::Put { cursor_after } => VisualPut { cursor_after }.execute(ed, services, cmd),
            VisualOp::Reformat => VisualReformat.execute(ed, services, cmd),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `P` / `gP` (`cursor_after`), `]P` (`indent`).
    PutBefore { count: usize, indent: bool, cursor_after: bool },
    /// `p` / `gp` (`cursor_after`), `]p` (`indent`).
    PutAfter { count: usize, indent: bool, cursor_after: bool },
    YankLine { count: usize },
    YankMotion { count: usize, argument: Argument },
    Visual { op: VisualOp, command: Command },
    ToggleVisual(SubMode),
    ExitVisual,
    MoveCaret(usize),
    SelectRegister(char),
    /// Insert-mode text at the caret.
    Type(String),
    Escape,
    Undo,
    Redo,
    RepeatLastChange,
}

/// Work postponed until no command is recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    Undo,
}

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// The document text changed.
    pub dirty: bool,
    /// The action was accepted; false when a guard refused it.
    pub handled: bool,
    /// The action was queued for [`Dispatcher::run_deferred`].
    pub deferred: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            handled: true,
            deferred: false,
        }
    }
    pub fn clean() -> Self {
        Self {
            dirty: false,
            handled: true,
            deferred: false,
        }
    }
    pub fn refused() -> Self {
        Self {
            dirty: false,
            handled: false,
            deferred: false,
        }
    }
    pub fn deferred() -> Self {
        Self {
            dirty: false,
            handled: true,
            deferred: true,
        }
    }

    fn from_outcome(handled: bool, before: &TextSnapshot, ed: &Editor) -> Self {
        Self {
            dirty: !ed.buffer().same_text(before),
            handled,
            deferred: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    deferred: VecDeque<DeferredTask>,
    last_visual: Option<(VisualOp, Command)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    pub fn dispatch(
        &mut self,
        action: Action,
        ed: &mut Editor,
        services: &Services,
    ) -> Result<DispatchResult, ActionError> {
        trace!(target: "actions.dispatch", ?action, "dispatch");
        let before = ed.buffer().snapshot();
        let handled = match action {
            Action::PutBefore { count, indent, cursor_after } => {
                let ok = ed.execute_command("Vim Put", |ed| {
                    copy::put_text_before_cursor(ed, services, count, indent, cursor_after)
                })?;
                ed.registers.reset_register();
                ok
            }
            Action::PutAfter { count, indent, cursor_after } => {
                let ok = ed.execute_command("Vim Put", |ed| {
                    copy::put_text_after_cursor(ed, services, count, indent, cursor_after)
                })?;
                ed.registers.reset_register();
                ok
            }
            Action::YankLine { count } => {
                let ok = copy::yank_line(ed, count);
                ed.registers.reset_register();
                ok
            }
            Action::YankMotion { count, argument } => {
                let ok = copy::yank_motion(ed, count, &argument);
                ed.registers.reset_register();
                ok
            }
            Action::Visual { op, command } => {
                let ok = ed.execute_command(&command.name, |ed| op.run(ed, services, &command))?;
                ed.registers.reset_register();
                if ok {
                    self.last_visual = Some((op, command));
                }
                ok
            }
            Action::ToggleVisual(sub_mode) => {
                ed.toggle_visual(sub_mode);
                ed.mark_vim_undoable("Vim Visual");
                true
            }
            Action::ExitVisual => {
                ed.exit_visual();
                true
            }
            Action::MoveCaret(offset) => {
                ed.move_caret(offset);
                true
            }
            Action::SelectRegister(name) => ed.registers.select_register(name),
            Action::Type(text) => {
                ed.type_text(&text)?;
                true
            }
            Action::Escape => {
                ed.escape();
                true
            }
            Action::Undo => {
                self.deferred.push_back(DeferredTask::Undo);
                debug!(target: "actions.dispatch", pending = self.deferred.len(), "undo_deferred");
                return Ok(DispatchResult::deferred());
            }
            Action::Redo => undo_walker::redo(ed, services.config.undo())?,
            Action::RepeatLastChange => self.repeat_last_change(ed, services)?,
        };
        Ok(DispatchResult::from_outcome(handled, &before, ed))
    }

    /// Run the queued tasks in order.
    pub fn run_deferred(&mut self, ed: &mut Editor, services: &Services) -> Result<DispatchResult, ActionError> {
        let before = ed.buffer().snapshot();
        let mut handled = false;
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::Undo => {
                    handled |= undo_walker::undo(ed, services.config.undo())?;
                }
            }
        }
        Ok(DispatchResult::from_outcome(handled, &before, ed))
    }

    /// `.` after a visual operator: re-select the previous shape at the caret
    /// and run the operator again.
    fn repeat_last_change(&mut self, ed: &mut Editor, services: &Services) -> Result<bool, ActionError> {
        let Some((op, command)) = self.last_visual.clone() else {
            return Ok(false);
        };
        if ed.session.last_visual_change().is_none() {
            return Ok(false);
        }
        debug!(target: "actions.dispatch", cmd = %command.name, "repeat_last_change");
        ed.session.push_mode(Mode::Repeat, SubMode::None);
        let result = ed.execute_command(&command.name, |ed| op.run(ed, services, &command));
        if ed.session.mode() == Mode::Repeat {
            ed.session.pop_mode();
        }
        ed.registers.reset_register();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandFlags;
    use core_state::SelectionType;

    fn editor(text: &str) -> Editor {
        Editor::new("dispatch", text).unwrap()
    }

    #[test]
    fn undo_is_deferred_until_run() {
        let services = Services::default();
        let mut d = Dispatcher::new();
        let mut ed = editor("abc\n");
        d.dispatch(Action::YankLine { count: 1 }, &mut ed, &services).unwrap();
        let r = d
            .dispatch(Action::PutAfter { count: 1, indent: false, cursor_after: false }, &mut ed, &services)
            .unwrap();
        assert!(r.dirty);
        assert_eq!(ed.text(), "abc\nabc\n");

        let r = d.dispatch(Action::Undo, &mut ed, &services).unwrap();
        assert!(r.deferred);
        assert_eq!(d.pending(), 1);
        assert_eq!(ed.text(), "abc\nabc\n");

        let r = d.run_deferred(&mut ed, &services).unwrap();
        assert!(r.dirty && r.handled);
        assert_eq!(d.pending(), 0);
        assert_eq!(ed.text(), "abc\n");
    }

    #[test]
    fn refused_register_is_reported() {
        let services = Services::default();
        let mut d = Dispatcher::new();
        let mut ed = editor("abc");
        let r = d.dispatch(Action::SelectRegister('!'), &mut ed, &services).unwrap();
        assert!(!r.handled);
    }

    #[test]
    fn visual_delete_is_one_undo_step() {
        let services = Services::default();
        let mut d = Dispatcher::new();
        let mut ed = editor("one two three");
        d.dispatch(Action::ToggleVisual(SubMode::VisualChar), &mut ed, &services).unwrap();
        d.dispatch(Action::MoveCaret(3), &mut ed, &services).unwrap();
        let cmd = Command::new("Vim Visual Delete", 1, CommandFlags::empty());
        d.dispatch(Action::Visual { op: VisualOp::Delete, command: cmd }, &mut ed, &services)
            .unwrap();
        assert_eq!(ed.text(), "two three");
        let reg = ed.registers.get('"').unwrap();
        assert_eq!((reg.text.as_str(), reg.selection_type), ("one ", SelectionType::CharacterWise));

        d.dispatch(Action::Undo, &mut ed, &services).unwrap();
        d.run_deferred(&mut ed, &services).unwrap();
        assert_eq!(ed.text(), "one two three");
        assert_eq!(ed.session.mode(), Mode::Normal);
    }
}
