//! Rope-based document abstraction.
//!
//! All offsets exposed by this crate are *char* offsets into the document,
//! matching `ropey`'s native indexing. Line numbers are zero based and a
//! document ending with `\n` owns an empty last line (so `"a\n"` has two
//! lines), the same convention the editing layers above rely on when they
//! compute "end of line + 1".
//!
//! Besides plain insert/delete the buffer carries two pieces of host-style
//! bookkeeping that the paste pipeline needs:
//! * live range markers (`create_range_marker`) that follow later edits, and
//! * guarded (read-only) blocks that reject edits while checking is enabled.

use anyhow::Result;
use ropey::Rope;
use thiserror::Error;
use tracing::debug;

mod marker;
mod range;

pub use marker::MarkerId;
pub use range::{LogicalPosition, TextRange};

use marker::MarkerSlot;

/// Whitespace accepted inside an indent.
pub const INDENT_CHARS: &str = " \t";
/// Whitespace including line breaks.
pub const WHITESPACE_CHARS: &str = " \t\n";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("offset {offset} is outside the document (length {len})")]
    OutOfBounds { offset: usize, len: usize },
    #[error("attempt to modify read-only fragment {range}")]
    ReadOnlyFragment { range: TextRange },
}

/// Opaque copy of the document text used by undo snapshots.
#[derive(Clone, Debug)]
pub struct TextSnapshot {
    rope: Rope,
}

impl TextSnapshot {
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn to_text(&self) -> String {
        self.rope.to_string()
    }

    /// Iterate the raw text chunks (used for content hashing).
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.rope.chunks()
    }
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
    markers: Vec<MarkerSlot>,
    guarded: Vec<MarkerSlot>,
    guard_checking: bool,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("len_chars", &self.rope.len_chars())
            .field("lines", &self.rope.len_lines())
            .finish()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
            markers: Vec::new(),
            guarded: Vec::new(),
            guard_checking: false,
        })
    }

    /// Total number of chars.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Whole document as an owned `String`.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn clamp_line(&self, line: usize) -> usize {
        line.min(self.rope.len_lines().saturating_sub(1))
    }

    /// Offset of the first char of `line` (clamped to the last line).
    pub fn line_start_offset(&self, line: usize) -> usize {
        self.rope.line_to_char(self.clamp_line(line))
    }

    /// Offset just past the last non-newline char of `line`.
    pub fn line_end_offset(&self, line: usize) -> usize {
        let line = self.clamp_line(line);
        self.rope.line_to_char(line) + self.line_len(line)
    }

    /// Length of `line` in chars, excluding its line break.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let n = slice.len_chars();
        if n > 0 && slice.char(n - 1) == '\n' {
            n - 1
        } else {
            n
        }
    }

    /// Content of `line` without its line break.
    pub fn line_text(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        let mut s = self.rope.line(line).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        s
    }

    /// Line containing `offset` (offsets past the end map to the last line).
    pub fn line_number(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    pub fn offset_to_position(&self, offset: usize) -> LogicalPosition {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        LogicalPosition::new(line, offset - self.rope.line_to_char(line))
    }

    /// Offset of `pos`; columns past the line end resolve to the line end.
    pub fn position_to_offset(&self, pos: LogicalPosition) -> usize {
        let line = self.clamp_line(pos.line);
        self.line_start_offset(line) + pos.column.min(self.line_len(line))
    }

    /// End of the line containing `offset`.
    pub fn line_end_for_offset(&self, offset: usize) -> usize {
        self.line_end_offset(self.line_number(offset))
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    /// Text covered by `range` (normalized and clamped to the document).
    pub fn slice(&self, range: TextRange) -> String {
        let r = range.normalize();
        let len = self.rope.len_chars();
        let s = r.start().min(len);
        let e = r.end().min(len);
        if s >= e {
            return String::new();
        }
        self.rope.slice(s..e).to_string()
    }

    /// First offset at or after `offset` whose char is not in `chars`.
    pub fn shift_forward(&self, offset: usize, chars: &str) -> usize {
        let len = self.rope.len_chars();
        let mut i = offset.min(len);
        while i < len && chars.contains(self.rope.char(i)) {
            i += 1;
        }
        i
    }

    /// Last offset before `offset` whose char is not in `chars`, or `None`
    /// when every char down to the document start matches.
    pub fn shift_backward(&self, offset: usize, chars: &str) -> Option<usize> {
        let mut i = offset.min(self.rope.len_chars());
        while i > 0 {
            i -= 1;
            if !chars.contains(self.rope.char(i)) {
                return Some(i);
            }
        }
        None
    }

    fn check_guard_insert(&self, offset: usize) -> Result<(), TextError> {
        if !self.guard_checking {
            return Ok(());
        }
        if let Some(g) = self
            .guarded
            .iter()
            .filter_map(MarkerSlot::range)
            .find(|g| offset > g.start() && offset < g.end())
        {
            debug!(target: "text.buffer", offset, guarded = %g, "guarded_insert_rejected");
            return Err(TextError::ReadOnlyFragment { range: g });
        }
        Ok(())
    }

    fn check_guard_delete(&self, range: TextRange) -> Result<(), TextError> {
        if !self.guard_checking {
            return Ok(());
        }
        if let Some(g) = self
            .guarded
            .iter()
            .filter_map(MarkerSlot::range)
            .find(|g| g.intersects(&range))
        {
            debug!(target: "text.buffer", range = %range, guarded = %g, "guarded_delete_rejected");
            return Err(TextError::ReadOnlyFragment { range: g });
        }
        Ok(())
    }

    /// Insert `text` at char `offset`.
    pub fn insert_str(&mut self, offset: usize, text: &str) -> Result<(), TextError> {
        let len = self.rope.len_chars();
        if offset > len {
            return Err(TextError::OutOfBounds { offset, len });
        }
        if text.is_empty() {
            return Ok(());
        }
        self.check_guard_insert(offset)?;
        let inserted = text.chars().count();
        self.rope.insert(offset, text);
        for m in self.markers.iter_mut().chain(self.guarded.iter_mut()) {
            m.on_insert(offset, inserted);
        }
        Ok(())
    }

    /// Delete the normalized `range` and return the removed text.
    pub fn delete(&mut self, range: TextRange) -> Result<String, TextError> {
        let r = range.normalize();
        let len = self.rope.len_chars();
        if r.end() > len {
            return Err(TextError::OutOfBounds {
                offset: r.end(),
                len,
            });
        }
        if r.is_empty() {
            return Ok(String::new());
        }
        self.check_guard_delete(r)?;
        let removed = self.rope.slice(r.start()..r.end()).to_string();
        self.rope.remove(r.start()..r.end());
        for m in self.markers.iter_mut().chain(self.guarded.iter_mut()) {
            m.on_delete(r.start(), r.end());
        }
        Ok(removed)
    }

    /// Replace `range` with `text`.
    pub fn replace(&mut self, range: TextRange, text: &str) -> Result<(), TextError> {
        let r = range.normalize();
        self.delete(r)?;
        self.insert_str(r.start(), text)
    }

    /// Start tracking `range` across subsequent edits.
    pub fn create_range_marker(&mut self, range: TextRange) -> MarkerId {
        self.markers.push(MarkerSlot::new(range));
        MarkerId(self.markers.len() - 1)
    }

    /// Current range of a marker, `None` once it has been invalidated.
    pub fn marker(&self, id: MarkerId) -> Option<TextRange> {
        self.markers.get(id.0).and_then(MarkerSlot::range)
    }

    /// Stop tracking a marker.
    pub fn release_marker(&mut self, id: MarkerId) {
        if let Some(slot) = self.markers.get_mut(id.0) {
            slot.valid = false;
        }
        while self.markers.last().is_some_and(|m| !m.valid) {
            self.markers.pop();
        }
    }

    /// Mark `range` read-only for edits performed while guard checking is on.
    /// The block follows later edits the same way a range marker does.
    pub fn add_guarded_block(&mut self, range: TextRange) {
        self.guarded.push(MarkerSlot::new(range));
    }

    pub fn start_guarded_block_checking(&mut self) {
        self.guard_checking = true;
    }

    pub fn stop_guarded_block_checking(&mut self) {
        self.guard_checking = false;
    }

    pub fn snapshot(&self) -> TextSnapshot {
        TextSnapshot {
            rope: self.rope.clone(),
        }
    }

    /// Replace the whole text with a snapshot. Live markers do not survive.
    pub fn restore(&mut self, snapshot: &TextSnapshot) {
        self.rope = snapshot.rope.clone();
        for m in &mut self.markers {
            m.valid = false;
        }
    }

    /// Cheap equality check against a snapshot (used to skip no-op undo records).
    pub fn same_text(&self, snapshot: &TextSnapshot) -> bool {
        self.rope == snapshot.rope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_buffer_and_read_line() {
        let b = Buffer::from_str("test", "hello\nworld").unwrap();
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line_text(0), "hello");
        assert_eq!(b.line_text(1), "world");
        assert_eq!(b.line_start_offset(1), 6);
        assert_eq!(b.line_end_offset(0), 5);
        assert_eq!(b.line_end_offset(1), 11);
    }

    #[test]
    fn trailing_newline_owns_empty_line() {
        let b = Buffer::from_str("t", "ab\n").unwrap();
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line_len(1), 0);
        assert_eq!(b.line_start_offset(1), 3);
    }

    #[test]
    fn position_round_trip_uses_chars() {
        let b = Buffer::from_str("t", "añb\nxyz").unwrap();
        assert_eq!(b.offset_to_position(2), LogicalPosition::new(0, 2));
        assert_eq!(b.offset_to_position(5), LogicalPosition::new(1, 1));
        assert_eq!(b.position_to_offset(LogicalPosition::new(1, 1)), 5);
        // Column past line end clamps to the line end.
        assert_eq!(b.position_to_offset(LogicalPosition::new(0, 40)), 3);
    }

    #[test]
    fn insert_and_delete_report_text() {
        let mut b = Buffer::from_str("t", "abcd").unwrap();
        b.insert_str(2, "XY").unwrap();
        assert_eq!(b.text(), "abXYcd");
        let removed = b.delete(TextRange::new(4, 1)).unwrap();
        assert_eq!(removed, "bXY");
        assert_eq!(b.text(), "acd");
        assert_eq!(
            b.insert_str(9, "z"),
            Err(TextError::OutOfBounds { offset: 9, len: 3 })
        );
    }

    #[test]
    fn shift_helpers_skip_whitespace() {
        let b = Buffer::from_str("t", "  \tx\n  y").unwrap();
        assert_eq!(b.shift_forward(0, INDENT_CHARS), 3);
        assert_eq!(b.shift_forward(4, WHITESPACE_CHARS), 7);
        assert_eq!(b.shift_backward(3, INDENT_CHARS), None);
        assert_eq!(b.shift_backward(7, INDENT_CHARS), Some(4));
    }

    #[test]
    fn markers_follow_edits() {
        let mut b = Buffer::from_str("t", "0123456789").unwrap();
        let id = b.create_range_marker(TextRange::new(2, 6));
        b.insert_str(0, "ab").unwrap();
        assert_eq!(b.marker(id), Some(TextRange::new(4, 8)));
        b.insert_str(5, "--").unwrap();
        assert_eq!(b.marker(id), Some(TextRange::new(4, 10)));
        b.delete(TextRange::new(0, 12)).unwrap();
        assert_eq!(b.marker(id), None);
        b.release_marker(id);
    }

    #[test]
    fn guarded_blocks_reject_edits_only_while_checking() {
        let mut b = Buffer::from_str("t", "keep this safe").unwrap();
        b.add_guarded_block(TextRange::new(5, 9));
        b.start_guarded_block_checking();
        assert!(matches!(
            b.insert_str(6, "x"),
            Err(TextError::ReadOnlyFragment { .. })
        ));
        assert!(matches!(
            b.delete(TextRange::new(3, 7)),
            Err(TextError::ReadOnlyFragment { .. })
        ));
        assert!(b.insert_str(0, ">").is_ok());
        // The block moved to [6, 10) with the insertion.
        assert!(matches!(
            b.insert_str(9, "x"),
            Err(TextError::ReadOnlyFragment { range }) if range == TextRange::new(6, 10)
        ));
        b.stop_guarded_block_checking();
        assert!(b.insert_str(7, "x").is_ok());
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let mut b = Buffer::from_str("t", "one\ntwo").unwrap();
        let snap = b.snapshot();
        b.insert_str(3, " more").unwrap();
        assert!(!b.same_text(&snap));
        b.restore(&snap);
        assert!(b.same_text(&snap));
        assert_eq!(b.text(), "one\ntwo");
    }
}
