//! Register store.
//!
//! Slots:
//! - `"` unnamed, mirrors the latest yank or delete.
//! - `0` latest yank.
//! - `1`..`9` delete ring, newest at `1`, oldest falls off the end.
//! - `a`..`z` named; writing through `A`..`Z` appends.
//! - `+` system clipboard. Only this slot carries a [`Transferable`].
//!
//! A register selected with `"x` applies to the next write or read and is then
//! cleared by [`RegisterStore::reset_register`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::SelectionType;

pub const UNNAMED_REGISTER: char = '"';
pub const YANK_REGISTER: char = '0';
pub const CLIPBOARD_REGISTER: char = '+';
const DELETE_RING_LEN: usize = 9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard content has no string flavor")]
    NoStringFlavor,
    #[error("clipboard content could not be read: {0}")]
    Unreadable(String),
}

/// Rich clipboard payload.
///
/// The paste pipeline only ever needs the plain text; the raw form is what
/// pre-processors get to compare against to decide whether they altered it.
pub trait Transferable: Debug {
    fn string_data(&self) -> Result<String, ClipboardError>;

    /// Text exactly as it sat on the clipboard, before any processing.
    fn raw_text(&self) -> Option<String> {
        self.string_data().ok()
    }

    /// Additional named flavors (e.g. "text/html").
    fn data(&self, _flavor: &str) -> Option<String> {
        None
    }
}

/// In-memory transferable used for clipboard writes made by the editor itself.
#[derive(Debug, Clone, Default)]
pub struct ClipboardText {
    text: Option<String>,
    extras: HashMap<String, String>,
}

impl ClipboardText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            extras: HashMap::new(),
        }
    }

    /// Payload that only offers non-string flavors.
    pub fn without_string_flavor() -> Self {
        Self::default()
    }

    pub fn with_flavor(mut self, flavor: impl Into<String>, data: impl Into<String>) -> Self {
        self.extras.insert(flavor.into(), data.into());
        self
    }
}

impl Transferable for ClipboardText {
    fn string_data(&self) -> Result<String, ClipboardError> {
        self.text.clone().ok_or(ClipboardError::NoStringFlavor)
    }

    fn data(&self, flavor: &str) -> Option<String> {
        self.extras.get(flavor).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct Register {
    pub name: char,
    pub text: String,
    pub selection_type: SelectionType,
    pub transferable: Option<Arc<dyn Transferable>>,
}

impl Register {
    pub fn new(name: char, text: impl Into<String>, selection_type: SelectionType) -> Self {
        Self {
            name,
            text: text.into(),
            selection_type,
            transferable: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterStore {
    slots: HashMap<char, Register>,
    delete_ring: Vec<Register>,
    selected: char,
}

impl Default for RegisterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterStore {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            delete_ring: Vec::with_capacity(DELETE_RING_LEN),
            selected: UNNAMED_REGISTER,
        }
    }

    pub fn is_valid_register(name: char) -> bool {
        name == UNNAMED_REGISTER
            || name == CLIPBOARD_REGISTER
            || name.is_ascii_digit()
            || name.is_ascii_alphabetic()
    }

    /// Select the register used by the next read/write. Returns false for an
    /// unknown register name.
    pub fn select_register(&mut self, name: char) -> bool {
        if !Self::is_valid_register(name) {
            return false;
        }
        self.selected = name;
        trace!(target: "state.registers", register = %name, "select_register");
        true
    }

    pub fn selected_register(&self) -> char {
        self.selected
    }

    pub fn reset_register(&mut self) {
        self.selected = UNNAMED_REGISTER;
    }

    /// Contents of the currently selected register.
    pub fn last_register(&self) -> Option<Register> {
        self.get(self.selected)
    }

    pub fn get(&self, name: char) -> Option<Register> {
        match name {
            '1'..='9' => {
                let idx = name as usize - '1' as usize;
                self.delete_ring.get(idx).cloned()
            }
            c => self.slots.get(&c.to_ascii_lowercase()).cloned(),
        }
    }

    /// Store text produced by a yank (`is_delete == false`) or a delete into the
    /// selected register, following the slot rules in the module docs.
    pub fn store(&mut self, text: impl Into<String>, selection_type: SelectionType, is_delete: bool) {
        let text = text.into();
        let target = self.selected;
        debug!(target: "state.registers", register = %target, ?selection_type, is_delete, len = text.chars().count(), "store");

        let stored = if target.is_ascii_uppercase() {
            let lower = target.to_ascii_lowercase();
            let merged = match self.slots.get(&lower) {
                Some(prev) => {
                    let mut joined = prev.text.clone();
                    if selection_type == SelectionType::LineWise && !joined.ends_with('\n') {
                        joined.push('\n');
                    }
                    joined.push_str(&text);
                    Register::new(lower, joined, selection_type)
                }
                None => Register::new(lower, text, selection_type),
            };
            self.slots.insert(lower, merged.clone());
            merged
        } else if target == CLIPBOARD_REGISTER {
            let mut reg = Register::new(CLIPBOARD_REGISTER, text.clone(), selection_type);
            reg.transferable = Some(Arc::new(ClipboardText::new(text)));
            self.slots.insert(CLIPBOARD_REGISTER, reg.clone());
            reg
        } else if target.is_ascii_lowercase() {
            let reg = Register::new(target, text, selection_type);
            self.slots.insert(target, reg.clone());
            reg
        } else {
            let reg = Register::new(UNNAMED_REGISTER, text, selection_type);
            if is_delete {
                self.push_delete_ring(reg.clone());
            } else {
                self.slots.insert(
                    YANK_REGISTER,
                    Register {
                        name: YANK_REGISTER,
                        ..reg.clone()
                    },
                );
            }
            reg
        };

        self.slots.insert(
            UNNAMED_REGISTER,
            Register {
                name: UNNAMED_REGISTER,
                ..stored
            },
        );
    }

    /// Put externally sourced clipboard content into `+`.
    pub fn store_clipboard(&mut self, payload: Arc<dyn Transferable>, selection_type: SelectionType) {
        let text = payload.string_data().unwrap_or_default();
        let reg = Register {
            name: CLIPBOARD_REGISTER,
            text,
            selection_type,
            transferable: Some(payload),
        };
        trace!(target: "state.registers", ?selection_type, "store_clipboard");
        self.slots.insert(CLIPBOARD_REGISTER, reg);
    }

    fn push_delete_ring(&mut self, reg: Register) {
        self.delete_ring.insert(0, reg);
        if self.delete_ring.len() > DELETE_RING_LEN {
            self.delete_ring.truncate(DELETE_RING_LEN);
            trace!(target: "state.registers", "delete_ring_rotated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn yank_fills_unnamed_and_zero() {
        let mut r = RegisterStore::new();
        r.store("abc", SelectionType::CharacterWise, false);
        assert_eq!(r.get('"').map(|r| r.text), Some("abc".to_string()));
        assert_eq!(r.get('0').map(|r| r.text), Some("abc".to_string()));
        assert!(r.get('1').is_none());
    }

    #[test]
    fn deletes_rotate_through_ring() {
        let mut r = RegisterStore::new();
        for i in 0..11 {
            r.store(format!("d{i}"), SelectionType::LineWise, true);
        }
        assert_eq!(r.get('1').map(|r| r.text), Some("d10".to_string()));
        assert_eq!(r.get('9').map(|r| r.text), Some("d2".to_string()));
        assert_eq!(r.get('"').map(|r| r.selection_type), Some(SelectionType::LineWise));
    }

    #[test]
    fn uppercase_named_register_appends() {
        let mut r = RegisterStore::new();
        assert!(r.select_register('a'));
        r.store("one", SelectionType::CharacterWise, false);
        assert!(r.select_register('A'));
        r.store("two", SelectionType::CharacterWise, false);
        r.reset_register();
        assert_eq!(r.get('a').map(|r| r.text), Some("onetwo".to_string()));
        assert_eq!(r.selected_register(), '"');
    }

    #[test]
    fn clipboard_register_is_rich() {
        let mut r = RegisterStore::new();
        r.store_clipboard(Arc::new(ClipboardText::new("x\n")), SelectionType::LineWise);
        r.select_register('+');
        let reg = r.last_register().expect("clipboard register");
        assert!(reg.transferable.is_some());
        assert_eq!(reg.text, "x\n");
        assert!(!r.select_register('!'));
    }
}
