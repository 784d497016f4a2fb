//! Offset ranges and logical positions.

/// A `[start, end)` pair of char offsets into a document.
///
/// Ranges are immutable and keep the order they were built with; callers that
/// need `start <= end` ask for [`TextRange::normalize`]. Motions and selections
/// routinely produce reversed ranges (a selection made by moving left), so the
/// constructor never reorders on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    start: usize,
    end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty range located at `offset`.
    pub const fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn end(&self) -> usize {
        self.end
    }

    /// Copy of this range with `start <= end`.
    pub fn normalize(&self) -> Self {
        if self.start <= self.end {
            *self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of chars covered, independent of orientation.
    pub fn len(&self) -> usize {
        self.start.abs_diff(self.end)
    }

    /// True when `offset` lies inside the normalized half-open range.
    pub fn contains(&self, offset: usize) -> bool {
        let n = self.normalize();
        offset >= n.start && offset < n.end
    }

    /// True when the two normalized ranges share at least one char.
    pub fn intersects(&self, other: &TextRange) -> bool {
        let a = self.normalize();
        let b = other.normalize();
        a.start < b.end && b.start < a.end
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Line/column pair; `column` counts chars from the line start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalPosition {
    pub line: usize,
    pub column: usize,
}

impl LogicalPosition {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_swaps_reversed_ends() {
        let r = TextRange::new(9, 3);
        assert_eq!(r.normalize(), TextRange::new(3, 9));
        assert_eq!(r.len(), 6);
        assert!(r.contains(3));
        assert!(!r.contains(9));
    }

    #[test]
    fn intersects_ignores_touching_ranges() {
        let a = TextRange::new(0, 4);
        assert!(a.intersects(&TextRange::new(3, 8)));
        assert!(!a.intersects(&TextRange::new(4, 8)));
        assert!(TextRange::new(8, 2).intersects(&TextRange::new(5, 6)));
    }

    proptest! {
        #[test]
        fn normalized_range_is_ordered(a in 0usize..10_000, b in 0usize..10_000) {
            let n = TextRange::new(a, b).normalize();
            prop_assert!(n.start() <= n.end());
            prop_assert_eq!(n.len(), a.abs_diff(b));
            prop_assert_eq!(n.normalize(), n);
        }
    }
}
