//! Delete primitives shared by the visual operators and visual put.

use core_model::Editor;
use core_state::SelectionType;
use core_text::TextRange;
use tracing::debug;

use crate::ActionError;

/// Delete `range` interpreted as `selection_type`, optionally saving the
/// removed text into the selected register. Block-wise ranges delete the same
/// column span from every covered line. The caret lands on the start of the
/// deleted range.
pub fn delete_range(
    ed: &mut Editor,
    range: TextRange,
    selection_type: SelectionType,
    store: bool,
) -> Result<bool, ActionError> {
    let range = range.normalize();
    let text = ed.range_text(range, selection_type);
    let caret = match selection_type {
        SelectionType::BlockWise => {
            let rows = ed.block_rows(range);
            let top_left = rows.last().map(|r| r.start()).unwrap_or(range.start());
            for row in rows {
                if !row.is_empty() {
                    ed.delete_text(row)?;
                }
            }
            top_left
        }
        _ => {
            if range.is_empty() {
                return Ok(false);
            }
            ed.delete_text(range)?;
            range.start()
        }
    };
    debug!(target: "actions.visual", range = %range, ?selection_type, store, "delete_range");
    if store {
        ed.registers.store(text, selection_type, true);
    }
    ed.move_caret(caret);
    Ok(true)
}

/// `x`: delete `count` characters under and after the caret, never past the
/// end of the line.
pub fn delete_character(ed: &mut Editor, count: usize, store: bool) -> Result<bool, ActionError> {
    let caret = ed.caret();
    let end = (caret + count.max(1)).min(ed.line_end_for_offset(caret));
    if end <= caret {
        return Ok(false);
    }
    delete_range(ed, TextRange::new(caret, end), SelectionType::CharacterWise, store)
}
