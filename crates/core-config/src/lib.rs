//! Configuration loading and parsing.
//!
//! Parses `vimput.toml` (or an override path supplied by the host) into three
//! tables:
//! - `[undo]`: command names the undo walker may merge as typing,
//! - `[paste]`: the re-indent strategy applied after a rich paste and the
//!   document size above which re-indentation is skipped,
//! - `[indent]`: tab and indent widths used for whitespace padding and by
//!   the built-in formatters.
//!
//! Every field has a default, unknown fields are ignored, and an unreadable or
//! malformed file falls back to the defaults with a warning instead of failing
//! the editor.

pub mod telemetry;

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "vimput.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UndoConfig {
    #[serde(default = "UndoConfig::default_mergeable_commands")]
    pub mergeable_commands: Vec<String>,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            mergeable_commands: Self::default_mergeable_commands(),
        }
    }
}

impl UndoConfig {
    fn default_mergeable_commands() -> Vec<String> {
        ["Typing", "Vim Backspace", "Choose Lookup Item"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn is_mergeable(&self, command: &str) -> bool {
        self.mergeable_commands.iter().any(|c| c == command)
    }
}

/// How pasted text is re-indented once it is in the document.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReformatOnPaste {
    NoReformat,
    #[default]
    IndentBlock,
    IndentEachLine,
    ReformatBlock,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PasteConfig {
    #[serde(default)]
    pub reformat_on_paste: ReformatOnPaste,
    #[serde(default = "PasteConfig::default_max_reformat_chars")]
    pub max_reformat_chars: usize,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            reformat_on_paste: ReformatOnPaste::default(),
            max_reformat_chars: Self::default_max_reformat_chars(),
        }
    }
}

impl PasteConfig {
    const fn default_max_reformat_chars() -> usize {
        2_500_000
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct IndentConfig {
    #[serde(default = "IndentConfig::default_width")]
    pub tab_size: usize,
    #[serde(default = "IndentConfig::default_width")]
    pub indent_size: usize,
    #[serde(default)]
    pub use_tabs: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            tab_size: Self::default_width(),
            indent_size: Self::default_width(),
            use_tabs: false,
        }
    }
}

impl IndentConfig {
    const fn default_width() -> usize {
        4
    }

    /// Whitespace string spanning `columns` visual columns.
    pub fn fill(&self, columns: usize) -> String {
        if self.use_tabs && self.tab_size > 0 {
            let mut s = "\t".repeat(columns / self.tab_size);
            s.push_str(&" ".repeat(columns % self.tab_size));
            s
        } else {
            " ".repeat(columns)
        }
    }

    /// Visual width of a run of indent characters.
    pub fn width_of(&self, indent: &str) -> usize {
        indent.chars().fold(0, |col, c| match c {
            '\t' if self.tab_size > 0 => (col / self.tab_size + 1) * self.tab_size,
            _ => col + 1,
        })
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub paste: PasteConfig,
    #[serde(default)]
    pub indent: IndentConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file contents, when a file was read.
    pub raw: Option<String>,
    pub file: ConfigFile,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("vimput").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                reformat_on_paste = ?file.paste.reformat_on_paste,
                mergeable = file.undo.mergeable_commands.len(),
                "config_loaded"
            );
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn undo(&self) -> &UndoConfig {
        &self.file.undo
    }

    pub fn paste(&self) -> &PasteConfig {
        &self.file.paste
    }

    pub fn indent(&self) -> IndentConfig {
        self.file.indent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
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

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.raw.is_none());
        assert!(cfg.undo().is_mergeable("Typing"));
        assert!(cfg.undo().is_mergeable("Choose Lookup Item"));
        assert_eq!(cfg.paste().reformat_on_paste, ReformatOnPaste::IndentBlock);
        assert_eq!(cfg.paste().max_reformat_chars, 2_500_000);
        assert_eq!(cfg.indent().tab_size, 4);
    }

    #[test]
    fn parses_all_tables() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[undo]\nmergeable_commands = [\"Typing\"]\n\
             [paste]\nreformat_on_paste = \"indent-each-line\"\nmax_reformat_chars = 10\n\
             [indent]\ntab_size = 8\nuse_tabs = true\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(!cfg.undo().is_mergeable("Vim Backspace"));
        assert_eq!(
            cfg.paste().reformat_on_paste,
            ReformatOnPaste::IndentEachLine
        );
        assert_eq!(cfg.paste().max_reformat_chars, 10);
        assert_eq!(cfg.indent().tab_size, 8);
        assert_eq!(cfg.indent().indent_size, 4);
        assert!(cfg.indent().use_tabs);
    }

    #[test]
    fn parse_error_falls_back_and_warns() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[paste]\nreformat_on_paste = \"sideways\"\n").unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || load_from(Some(tmp.path().to_path_buf()))).unwrap();

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed"));
        assert_eq!(cfg.file, ConfigFile::default());
    }

    #[test]
    fn indent_fill_and_width() {
        let spaces = IndentConfig::default();
        assert_eq!(spaces.fill(6), "      ");
        let tabs = IndentConfig {
            use_tabs: true,
            ..IndentConfig::default()
        };
        assert_eq!(tabs.fill(6), "\t  ");
        assert_eq!(tabs.width_of("\t  "), 6);
        assert_eq!(tabs.width_of(" \t"), 4);
    }
}
