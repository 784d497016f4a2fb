//! Motion span resolution for operators (yank by motion).
//!
//! Resolves a motion plus count from the caret into the `[start, end)` range
//! an operator acts on, without moving the caret:
//! * horizontal motions (left, right, word forward, line end) produce a
//!   character-wise range between the caret and the motion target,
//! * vertical motions (up, down) produce a line-wise range covering every
//!   line touched, including the final line break when there is one.
//!
//! A motion that cannot move (left at column 0, up on the first line) yields
//! `None` so the operator can report failure.

use core_state::SelectionType;
use core_text::{TextRange, WHITESPACE_CHARS};

use crate::Editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    WordForward,
    LineEnd,
    Up,
    Down,
}

impl Motion {
    pub fn is_linewise(self) -> bool {
        matches!(self, Motion::Up | Motion::Down)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word_forward(ed: &Editor, offset: usize) -> usize {
    let buf = ed.buffer();
    let len = buf.len_chars();
    let Some(first) = buf.char_at(offset) else {
        return len;
    };
    let mut i = offset;
    if !WHITESPACE_CHARS.contains(first) {
        let word = is_word_char(first);
        while let Some(c) = buf.char_at(i) {
            if WHITESPACE_CHARS.contains(c) || is_word_char(c) != word {
                break;
            }
            i += 1;
        }
    }
    buf.shift_forward(i, WHITESPACE_CHARS)
}

/// Range covered by `motion` repeated `count` times from the caret.
pub fn resolve_motion(ed: &Editor, motion: Motion, count: usize) -> Option<(TextRange, SelectionType)> {
    let count = count.max(1);
    let caret = ed.caret();
    let line = ed.caret_line();

    if motion.is_linewise() {
        let target = match motion {
            Motion::Up => line.checked_sub(count)?,
            _ => {
                let t = line.saturating_add(count);
                if t >= ed.line_count() {
                    return None;
                }
                t
            }
        };
        let first = line.min(target);
        let last = line.max(target);
        let end = (ed.line_end(last) + 1).min(ed.len_chars());
        return Some((
            TextRange::new(ed.line_start(first), end),
            SelectionType::LineWise,
        ));
    }

    let line_start = ed.line_start(line);
    let line_end = ed.line_end(line);
    let target = match motion {
        Motion::Left => {
            if caret == line_start {
                return None;
            }
            caret.saturating_sub(count).max(line_start)
        }
        Motion::Right => caret.saturating_add(count).min(line_end),
        Motion::LineEnd => ed.line_end(line.saturating_add(count - 1)),
        _ => {
            let mut at = caret;
            for _ in 0..count {
                let next = word_forward(ed, at);
                if next == at {
                    break;
                }
                at = next;
            }
            at
        }
    };
    if target == caret {
        return None;
    }
    Some((
        TextRange::new(caret, target).normalize(),
        SelectionType::CharacterWise,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str, caret: usize) -> Editor {
        let mut ed = Editor::new("motion", text).unwrap();
        ed.move_caret(caret);
        ed
    }

    #[test]
    fn word_forward_skips_word_and_blanks() {
        let ed = at("foo bar.baz", 0);
        let (r, ty) = resolve_motion(&ed, Motion::WordForward, 1).unwrap();
        assert_eq!(r, TextRange::new(0, 4));
        assert_eq!(ty, SelectionType::CharacterWise);
        let (r, _) = resolve_motion(&ed, Motion::WordForward, 2).unwrap();
        assert_eq!(r, TextRange::new(0, 7));
    }

    #[test]
    fn left_is_normalized_and_stops_at_line_start() {
        let ed = at("ab\ncdef", 6);
        let (r, _) = resolve_motion(&ed, Motion::Left, 10).unwrap();
        assert_eq!(r, TextRange::new(3, 6));
        assert!(resolve_motion(&at("ab\ncd", 3), Motion::Left, 1).is_none());
    }

    #[test]
    fn line_end_and_right() {
        let ed = at("hello\nworld", 1);
        assert_eq!(
            resolve_motion(&ed, Motion::LineEnd, 1).map(|(r, _)| r),
            Some(TextRange::new(1, 5))
        );
        assert_eq!(
            resolve_motion(&ed, Motion::Right, 2).map(|(r, _)| r),
            Some(TextRange::new(1, 3))
        );
    }

    #[test]
    fn vertical_motions_are_linewise() {
        let ed = at("a\nb\nc", 2);
        let (r, ty) = resolve_motion(&ed, Motion::Down, 1).unwrap();
        assert_eq!(ty, SelectionType::LineWise);
        assert_eq!(r, TextRange::new(2, 5));
        let (r, _) = resolve_motion(&ed, Motion::Up, 1).unwrap();
        assert_eq!(r, TextRange::new(0, 4));
        assert!(resolve_motion(&ed, Motion::Down, 2).is_none());
    }

    #[test]
    fn huge_counts_clamp_to_the_document() {
        let ed = at("ab cd
ef", 1);
        let huge = usize::MAX;
        assert_eq!(resolve_motion(&ed, Motion::Right, huge).map(|(r, _)| r), Some(TextRange::new(1, 5)));
        assert_eq!(resolve_motion(&ed, Motion::LineEnd, huge).map(|(r, _)| r), Some(TextRange::new(1, 8)));
        assert_eq!(resolve_motion(&ed, Motion::WordForward, huge).map(|(r, _)| r), Some(TextRange::new(1, 8)));
        assert!(resolve_motion(&ed, Motion::Down, huge).is_none());
    }
}
