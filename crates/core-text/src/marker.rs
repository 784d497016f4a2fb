//! Live range markers.
//!
//! A marker tracks a `[start, end)` span across later edits of the same
//! buffer. Insertions before the span shift it, insertions strictly inside
//! grow it, insertions exactly at either end stay outside (markers are not
//! greedy). A deletion that swallows a non-empty marker invalidates it.

use crate::TextRange;

/// Handle returned by [`crate::Buffer::create_range_marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) struct MarkerSlot {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) valid: bool,
}

impl MarkerSlot {
    pub(crate) fn new(range: TextRange) -> Self {
        let r = range.normalize();
        Self {
            start: r.start(),
            end: r.end(),
            valid: true,
        }
    }

    pub(crate) fn range(&self) -> Option<TextRange> {
        self.valid.then(|| TextRange::new(self.start, self.end))
    }

    pub(crate) fn on_insert(&mut self, offset: usize, len: usize) {
        if !self.valid || len == 0 {
            return;
        }
        if offset <= self.start {
            self.start += len;
            self.end += len;
        } else if offset < self.end {
            self.end += len;
        }
    }

    pub(crate) fn on_delete(&mut self, from: usize, to: usize) {
        if !self.valid || from >= to {
            return;
        }
        let removed = to - from;
        if from <= self.start && to >= self.end && self.start < self.end {
            self.valid = false;
            return;
        }
        let shift = |p: usize| {
            if p >= to {
                p - removed
            } else if p > from {
                from
            } else {
                p
            }
        };
        self.start = shift(self.start);
        self.end = shift(self.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_at_edges_stays_outside() {
        let mut m = MarkerSlot::new(TextRange::new(5, 10));
        m.on_insert(5, 2);
        assert_eq!(m.range(), Some(TextRange::new(7, 12)));
        m.on_insert(12, 3);
        assert_eq!(m.range(), Some(TextRange::new(7, 12)));
        m.on_insert(8, 1);
        assert_eq!(m.range(), Some(TextRange::new(7, 13)));
    }

    #[test]
    fn delete_shrinks_or_invalidates() {
        let mut m = MarkerSlot::new(TextRange::new(5, 10));
        m.on_delete(3, 7);
        assert_eq!(m.range(), Some(TextRange::new(3, 6)));
        m.on_delete(0, 20);
        assert_eq!(m.range(), None);
    }
}
