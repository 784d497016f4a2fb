//! Vim editing actions over the editor model.
//!
//! Layers, bottom up:
//! * `change`      - delete primitives (character/line/block-wise ranges)
//! * `copy`        - yank and put: register text into the document with the
//!   caret placement table
//! * `paste`       - rich clipboard paste with re-indent strategies
//! * `visual`      - visual operator lifecycle (range computation before the
//!   operator, mode/caret restoration after it) and the visual operators
//! * `undo_walker` - undo/redo that skips internal records and merges typing
//! * `dispatcher`  - applies [`dispatcher::Action`]s, owning the deferred queue
//!   used by undo and the state needed for dot-repeat
//!
//! Host collaborators that are not editor state (formatter, paste processors,
//! bell, read-only fragment handler, configuration) reach the actions through
//! [`host::Services`].

pub mod change;
pub mod copy;
pub mod dispatcher;
pub mod format;
pub mod host;
pub mod paste;
pub mod undo_walker;
pub mod visual;

pub use dispatcher::{Action, DispatchResult, Dispatcher};
pub use host::{HostUi, PastePostProcessor, PastePreProcessor, Services};

use bitflags::bitflags;
use core_model::Motion;
use core_state::{LedgerError, SelectionType};
use core_text::TextError;
use thiserror::Error;

bitflags! {
    /// Behaviour flags carried by a command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandFlags: u32 {
        /// The motion (or the command's range) is line-wise.
        const MOT_LINEWISE   = 0b0000_0001;
        /// The motion (or the command's range) is block-wise.
        const MOT_BLOCKWISE  = 0b0000_0010;
        /// Further keys follow and belong to the same undo step; leave visual
        /// mode before the operator runs.
        const MULTIKEY_UNDO  = 0b0000_0100;
        /// Operate on whole lines while in a visual mode.
        const FORCE_LINEWISE = 0b0000_1000;
        /// The command waits for more input, so visual mode must survive it.
        const EXPECT_MORE    = 0b0001_0000;
    }
}

impl CommandFlags {
    /// Selection type a motion with these flags produces.
    pub fn selection_type(self) -> SelectionType {
        if self.contains(CommandFlags::MOT_LINEWISE) {
            SelectionType::LineWise
        } else if self.contains(CommandFlags::MOT_BLOCKWISE) {
            SelectionType::BlockWise
        } else {
            SelectionType::CharacterWise
        }
    }
}

/// A fully parsed command: what to run, how many times, with which flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub count: usize,
    pub flags: CommandFlags,
}

impl Command {
    pub fn new(name: impl Into<String>, count: usize, flags: CommandFlags) -> Self {
        Self {
            name: name.into(),
            count: count.max(1),
            flags,
        }
    }

    pub fn has(&self, flag: CommandFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Motion argument of an operator (`y<motion>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument {
    pub motion: Motion,
    pub count: usize,
}

impl Argument {
    pub fn new(motion: Motion, count: usize) -> Self {
        Self {
            motion,
            count: count.max(1),
        }
    }

    pub fn flags(&self) -> CommandFlags {
        if self.motion.is_linewise() {
            CommandFlags::MOT_LINEWISE
        } else {
            CommandFlags::empty()
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error(transparent)]
    Text(#[from] TextError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_selection_type() {
        assert_eq!(
            CommandFlags::MOT_LINEWISE.selection_type(),
            SelectionType::LineWise
        );
        assert_eq!(
            (CommandFlags::MOT_BLOCKWISE | CommandFlags::EXPECT_MORE).selection_type(),
            SelectionType::BlockWise
        );
        assert_eq!(
            CommandFlags::empty().selection_type(),
            SelectionType::CharacterWise
        );
        assert_eq!(
            Argument::new(Motion::Down, 0).flags().selection_type(),
            SelectionType::LineWise
        );
    }
}
