#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};

use core_actions::{HostUi, Services};
use core_config::{Config, ConfigFile, PasteConfig, ReformatOnPaste};
use core_model::Editor;
use core_state::{CommandRecord, LedgerError, UndoDirection, UndoLedger};
use core_text::TextError;
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

pub fn editor(text: &str) -> Editor {
    Editor::new("test", text).unwrap()
}

pub fn editor_at(text: &str, caret: usize) -> Editor {
    let mut ed = editor(text);
    ed.move_caret(caret);
    ed
}

pub fn services_with_strategy(strategy: ReformatOnPaste) -> Services {
    Services::new(Config {
        raw: None,
        file: ConfigFile {
            paste: PasteConfig {
                reformat_on_paste: strategy,
                ..PasteConfig::default()
            },
            ..ConfigFile::default()
        },
    })
}

/// UI double counting bells and read-only notifications.
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub beeps: Cell<usize>,
    pub read_only: RefCell<Vec<TextError>>,
}

impl HostUi for RecordingUi {
    fn beep(&self) {
        self.beeps.set(self.beeps.get() + 1);
    }

    fn read_only_fragment(&self, error: &TextError) {
        self.read_only.borrow_mut().push(error.clone());
    }
}

pub fn recording_services() -> (Services, Rc<RecordingUi>) {
    let ui = Rc::new(RecordingUi::default());
    (Services::default().with_ui(Rc::clone(&ui)), ui)
}

/// In-memory ledger for driving the undo walker without an editor.
#[derive(Debug, Default)]
pub struct FakeLedger {
    pub undo: Vec<CommandRecord>,
    pub redo: Vec<CommandRecord>,
    /// Steps report success without moving any record.
    pub stuck: bool,
    pub steps: usize,
}

impl FakeLedger {
    pub fn with_records(records: Vec<CommandRecord>) -> Self {
        Self {
            undo: records,
            ..Self::default()
        }
    }

    fn stacks(&mut self, direction: UndoDirection) -> (&mut Vec<CommandRecord>, &mut Vec<CommandRecord>) {
        match direction {
            UndoDirection::Undo => (&mut self.undo, &mut self.redo),
            UndoDirection::Redo => (&mut self.redo, &mut self.undo),
        }
    }
}

impl UndoLedger for FakeLedger {
    fn is_available(&self, direction: UndoDirection) -> bool {
        match direction {
            UndoDirection::Undo => !self.undo.is_empty(),
            UndoDirection::Redo => !self.redo.is_empty(),
        }
    }

    fn last_record(&self, direction: UndoDirection) -> Result<Option<&CommandRecord>, LedgerError> {
        Ok(match direction {
            UndoDirection::Undo => self.undo.last(),
            UndoDirection::Redo => self.redo.last(),
        })
    }

    fn depth(&self, direction: UndoDirection) -> Result<usize, LedgerError> {
        Ok(match direction {
            UndoDirection::Undo => self.undo.len(),
            UndoDirection::Redo => self.redo.len(),
        })
    }

    fn step(&mut self, direction: UndoDirection) -> Result<bool, LedgerError> {
        if !self.is_available(direction) {
            return Ok(false);
        }
        self.steps += 1;
        if self.stuck {
            return Ok(true);
        }
        let (from, to) = self.stacks(direction);
        if let Some(rec) = from.pop() {
            to.push(rec);
        }
        Ok(true)
    }
}

struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl<'a> Write for LockedWriter<'a> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

/// Run `f` with a debug-level subscriber and return its result plus the
/// formatted log output.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(BufferWriter {
            inner: Arc::clone(&buffer),
        })
        .finish();
    let out = with_default(subscriber, f);
    let logs = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    (out, logs)
}
