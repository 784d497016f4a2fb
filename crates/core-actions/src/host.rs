//! Host collaborators that are not part of the editor itself.

use std::rc::Rc;

use core_config::Config;
use core_model::Editor;
use core_state::Transferable;
use core_text::{TextError, TextRange};
use tracing::{info, warn};

use crate::format::{Formatter, PlainTextFormatter};

/// User-facing feedback channel of the host.
pub trait HostUi {
    /// Audible bell (clipboard content could not be read).
    fn beep(&self);

    /// A paste tried to write into a guarded block.
    fn read_only_fragment(&self, error: &TextError);
}

impl<T: HostUi + ?Sized> HostUi for Rc<T> {
    fn beep(&self) {
        (**self).beep()
    }

    fn read_only_fragment(&self, error: &TextError) {
        (**self).read_only_fragment(error)
    }
}

/// Default UI: reports through the log only.
#[derive(Debug, Default)]
pub struct LogUi;

impl HostUi for LogUi {
    fn beep(&self) {
        info!(target: "actions.paste", "beep");
    }

    fn read_only_fragment(&self, error: &TextError) {
        warn!(target: "actions.paste", %error, "read_only_fragment");
    }
}

/// Rewrites clipboard text before it is inserted (language-specific escaping
/// and the like). `raw` is the payload as it sat on the clipboard.
pub trait PastePreProcessor {
    fn preprocess_on_paste(&self, editor: &Editor, text: &str, raw: Option<&str>) -> String;
}

/// Post-insertion hook fed with data it extracted from the clipboard payload.
pub trait PastePostProcessor {
    /// Data this processor needs from the payload, `None` when it has no
    /// interest in this paste.
    fn extract_transferable_data(&self, content: &dyn Transferable) -> Option<String>;

    /// Runs once the text is in the document. `bounds` is the pasted range.
    /// Returns true when the processor already fixed the indentation.
    fn process_transferable_data(
        &self,
        editor: &mut Editor,
        bounds: TextRange,
        caret_offset: usize,
        data: &str,
    ) -> Result<bool, TextError>;
}

pub struct Services {
    pub config: Config,
    pub formatter: Box<dyn Formatter>,
    pub pre_processors: Vec<Box<dyn PastePreProcessor>>,
    pub post_processors: Vec<Box<dyn PastePostProcessor>>,
    pub ui: Box<dyn HostUi>,
}

impl Services {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            formatter: Box::new(PlainTextFormatter),
            pre_processors: Vec::new(),
            post_processors: Vec::new(),
            ui: Box::new(LogUi),
        }
    }

    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn with_ui(mut self, ui: impl HostUi + 'static) -> Self {
        self.ui = Box::new(ui);
        self
    }

    pub fn with_pre_processor(mut self, p: impl PastePreProcessor + 'static) -> Self {
        self.pre_processors.push(Box::new(p));
        self
    }

    pub fn with_post_processor(mut self, p: impl PastePostProcessor + 'static) -> Self {
        self.post_processors.push(Box::new(p));
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
