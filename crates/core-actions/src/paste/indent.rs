//! Re-indent strategies applied to a freshly pasted block.

use core_model::Editor;
use core_text::{INDENT_CHARS, TextError, TextRange, WHITESPACE_CHARS};
use tracing::trace;

use crate::format::Formatter;
use crate::host::Services;

pub(super) fn indent_block(
    ed: &mut Editor,
    services: &Services,
    start: usize,
    end: usize,
    anchor_column: usize,
) -> Result<(), TextError> {
    if services.formatter.has_language_formatting() {
        indent_block_with_formatter(ed, services.formatter.as_ref(), start, end)
    } else {
        indent_plain_text_block(ed, start, end, anchor_column)
    }
}

/// Without a formatter, lines after the first are shifted right by the column
/// the paste started at, so a multi-line paste keeps its shape.
fn indent_plain_text_block(
    ed: &mut Editor,
    start: usize,
    end: usize,
    indent_level: usize,
) -> Result<(), TextError> {
    let space_end = ed.buffer().shift_forward(start, INDENT_CHARS);
    let start_line = ed.buffer().line_number(start);
    if space_end > end
        || indent_level == 0
        || start_line + 1 >= ed.line_count()
        || ed.buffer().char_at(space_end) == Some('\n')
    {
        return Ok(());
    }
    let mut end_line = start_line + 1;
    while end_line < ed.line_count() && ed.line_start(end_line) < end {
        end_line += 1;
    }
    trace!(target: "actions.paste", start_line, end_line, indent_level, "indent_plain_text_block");
    indent_lines(ed, start_line + 1, end_line - 1, &" ".repeat(indent_level))
}

/// Let the formatter place the first non-blank line of the paste, then move
/// the other lines by the same amount so the block keeps its inner layout.
fn indent_block_with_formatter(
    ed: &mut Editor,
    formatter: &dyn Formatter,
    start: usize,
    mut end: usize,
) -> Result<(), TextError> {
    let first_line = ed.buffer().line_number(start);
    let first_line_start = ed.line_start(first_line);

    // The whitespace after the last line break belongs to the line that
    // follows the paste; give that line the indent of the first one.
    let mut ends_with_break = false;
    let mut i = end;
    while i > start {
        i -= 1;
        match ed.buffer().char_at(i) {
            Some('\n') => {
                ends_with_break = true;
                break;
            }
            Some(' ' | '\t') => {}
            _ => break,
        }
    }
    let last_line = if ends_with_break {
        let last_line = ed.buffer().line_number(end).saturating_sub(1);
        let next_start = ed.line_start(last_line + 1);
        if next_start < end {
            let indent_end = ed.buffer().shift_forward(next_start, INDENT_CHARS).min(end);
            if indent_end > next_start {
                ed.buffer_mut().delete(TextRange::new(next_start, indent_end))?;
                end -= indent_end - next_start;
            }
        }
        let keep_end = start.min(ed.buffer().shift_forward(first_line_start, INDENT_CHARS));
        if keep_end > first_line_start {
            let kept = ed.buffer().slice(TextRange::new(first_line_start, keep_end));
            ed.insert_text(next_start, &kept)?;
            end += kept.chars().count();
        }
        last_line
    } else {
        ed.buffer().line_number(end)
    };

    // Pasted in the middle of a line: only the continuation lines move.
    let before = ed.buffer().shift_backward(start, INDENT_CHARS);
    if ed.buffer().char_at(start) != Some('\n')
        && before.is_some_and(|b| b > 0 && ed.buffer().char_at(b) != Some('\n'))
    {
        let first_non_ws = ed.buffer().shift_forward(first_line_start, INDENT_CHARS);
        if first_non_ws > first_line_start {
            let indent = ed.buffer().slice(TextRange::new(first_line_start, first_non_ws));
            indent_lines(ed, first_line + 1, last_line, &indent)?;
        }
        return Ok(());
    }

    let anchor = ed.buffer().shift_forward(start, WHITESPACE_CHARS);
    if anchor >= end {
        return Ok(());
    }
    let anchor_line = ed.buffer().line_number(anchor);
    let anchor_line_start = ed.line_start(anchor_line);
    formatter.adjust_line_indent(ed, anchor)?;

    if anchor_line == first_line && anchor == start {
        let indent_end = ed.buffer().shift_forward(first_line_start, INDENT_CHARS);
        if indent_end > first_line_start {
            let indent = ed.buffer().slice(TextRange::new(first_line_start, indent_end));
            indent_lines(ed, first_line + 1, last_line, &indent)?;
        }
        return Ok(());
    }

    let first_non_ws = ed.buffer().shift_forward(anchor_line_start, INDENT_CHARS);
    trace!(target: "actions.paste", anchor_line, last_line, shift = first_non_ws as isize - anchor as isize, "indent_block_with_formatter");
    if first_non_ws == anchor {
        return Ok(());
    }
    if first_non_ws > anchor {
        let diff = first_non_ws - anchor;
        let indent = ed
            .buffer()
            .slice(TextRange::new(anchor_line_start, anchor_line_start + diff));
        return indent_lines(ed, anchor_line + 1, last_line, &indent);
    }

    let removed = anchor - first_non_ws;
    let lead = start - first_line_start;
    if anchor_line == first_line && removed == lead {
        return Ok(());
    }
    if anchor_line != first_line || removed > lead {
        let desired = if anchor_line == first_line {
            removed - lead
        } else {
            removed
        };
        for line in anchor_line + 1..=last_line {
            let line_start = ed.line_start(line);
            let indent_end = ed.buffer().shift_forward(line_start, INDENT_CHARS);
            let n = (indent_end - line_start).min(desired);
            if n > 0 {
                ed.buffer_mut().delete(TextRange::new(line_start, line_start + n))?;
            }
        }
        Ok(())
    } else {
        let indent = ed
            .buffer()
            .slice(TextRange::new(anchor_line_start, start - removed));
        indent_lines(ed, anchor_line + 1, last_line, &indent)
    }
}

/// Re-indent every pasted line. A paste that is exactly a run of whole lines
/// must not touch the line after it.
pub(super) fn indent_each_line(
    ed: &mut Editor,
    services: &Services,
    start: usize,
    mut end: usize,
) -> Result<(), TextError> {
    if start > 0
        && end > start + 1
        && ed.buffer().char_at(end - 1) == Some('\n')
        && ed.buffer().char_at(start - 1) == Some('\n')
    {
        end -= 1;
    }
    trace!(target: "actions.paste", start, end, "indent_each_line");
    services
        .formatter
        .adjust_line_indent_range(ed, TextRange::new(start, end))
}

/// Prefix lines `first..=last` with `indent`.
fn indent_lines(ed: &mut Editor, first: usize, last: usize, indent: &str) -> Result<(), TextError> {
    if indent.is_empty() {
        return Ok(());
    }
    for line in first..=last.min(ed.line_count().saturating_sub(1)) {
        let at = ed.line_start(line);
        ed.insert_text(at, indent)?;
    }
    Ok(())
}
