//! Where the caret lands after a put.
//!
//! Keyed by the register's selection type, whether the put happened from
//! VisualLine mode, and whether the command asked for the caret after the
//! text (`gp`/`gP`).

use core_model::Editor;
use core_state::{SelectionType, SubMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretRule {
    InsertionStart,
    EndMinusOne,
    FirstNonBlank,
    AfterEnd,
    /// End of the put, but never past the last character of its final line.
    EndOfLineBounded,
}

/// (selection type, put from VisualLine, cursor after)
type Key = (SelectionType, bool, bool);

const CARET_TABLE: [(Key, CaretRule); 12] = [
    ((SelectionType::BlockWise, true, false), CaretRule::InsertionStart),
    ((SelectionType::BlockWise, true, true), CaretRule::AfterEnd),
    ((SelectionType::BlockWise, false, false), CaretRule::InsertionStart),
    ((SelectionType::BlockWise, false, true), CaretRule::EndOfLineBounded),
    ((SelectionType::LineWise, true, false), CaretRule::FirstNonBlank),
    ((SelectionType::LineWise, true, true), CaretRule::AfterEnd),
    ((SelectionType::LineWise, false, false), CaretRule::FirstNonBlank),
    ((SelectionType::LineWise, false, true), CaretRule::AfterEnd),
    ((SelectionType::CharacterWise, true, false), CaretRule::InsertionStart),
    ((SelectionType::CharacterWise, true, true), CaretRule::AfterEnd),
    ((SelectionType::CharacterWise, false, false), CaretRule::EndMinusOne),
    ((SelectionType::CharacterWise, false, true), CaretRule::EndOfLineBounded),
];

pub fn caret_rule(selection_type: SelectionType, sub_mode: SubMode, cursor_after: bool) -> CaretRule {
    let key = (selection_type, sub_mode == SubMode::VisualLine, cursor_after);
    CARET_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, rule)| *rule)
        .unwrap_or(CaretRule::InsertionStart)
}

/// Offset chosen by `rule` for a put that covered `[start, end)`, clamped to
/// the document.
pub fn resolve(ed: &Editor, rule: CaretRule, start: usize, end: usize) -> usize {
    let target = match rule {
        CaretRule::InsertionStart => start,
        CaretRule::EndMinusOne => end.saturating_sub(1),
        CaretRule::FirstNonBlank => ed.first_non_blank(start),
        CaretRule::AfterEnd => end + 1,
        CaretRule::EndOfLineBounded => {
            end.min(ed.line_end_for_offset(end.saturating_sub(1)).saturating_sub(1))
        }
    };
    target.min(ed.len_chars())
}
