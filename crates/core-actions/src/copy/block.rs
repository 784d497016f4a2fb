use core_model::Editor;
use core_state::SubMode;
use core_text::{LogicalPosition, TextError};
use tracing::trace;

/// Insert `text` as a rectangle whose top-left corner is `offset`, repeated
/// `count` times side by side. Every row is padded to the width of the widest
/// register line, except the first row when nothing follows the insertion
/// column and rows that end their own line in VisualLine mode. Lines shorter
/// than the insertion column get whitespace fill. Missing lines below the
/// document end are appended first.
///
/// Returns the offset just past the last inserted row.
pub(super) fn put_block(
    ed: &mut Editor,
    offset: usize,
    text: &str,
    count: usize,
    sub_mode: SubMode,
) -> Result<usize, TextError> {
    let start = ed.position(offset);
    let col = if sub_mode == SubMode::VisualLine {
        0
    } else {
        start.column
    };
    let mut line = start.line;

    let mut segments: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        segments.pop();
    }
    let lines = segments.len();

    if line + lines > ed.line_count() {
        let missing = line + lines - ed.line_count();
        let at = ed.len_chars();
        ed.insert_text(at, &"\n".repeat(missing))?;
    }

    let width = segments
        .iter()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0);
    trace!(target: "actions.put", line, col, lines, width, count, "put_block");

    let mut end_offset = offset;
    for (i, segment) in segments.into_iter().enumerate() {
        let seg_len = segment.chars().count();
        let padded = format!("{segment}{}", " ".repeat(width - seg_len));
        let trailing = if sub_mode == SubMode::VisualLine || (i == 0 && col >= ed.line_len(line)) {
            segment.to_string()
        } else {
            padded.clone()
        };
        let pad = ed.pad(line, col);
        let insoff = ed.offset(LogicalPosition::new(line, col));

        let mut row = padded.repeat(count.saturating_sub(1));
        row.push_str(&trailing);
        ed.insert_text(insoff, &row)?;
        end_offset = insoff + row.chars().count();

        if sub_mode == SubMode::VisualLine {
            ed.insert_text(end_offset, "\n")?;
            end_offset += 1;
        } else if !pad.is_empty() {
            ed.insert_text(insoff, &pad)?;
            end_offset += pad.chars().count();
        }
        line += 1;
    }
    Ok(end_offset)
}
