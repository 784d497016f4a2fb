//! Yank and put.
//!
//! Every put funnels into [`put_text`], which inserts register text of any
//! selection type at an offset and then places the caret with the table in
//! [`caret`]. Registers carrying a rich clipboard payload are handed to the
//! paste pipeline instead (block-wise text never is).

mod block;
pub mod caret;

use core_model::{Editor, resolve_motion};
use core_state::{Register, SelectionType, SubMode};
use core_text::TextRange;
use tracing::{debug, trace};

use crate::host::Services;
use crate::{ActionError, Argument, paste};

/// One put request as [`put_text`] consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutText {
    pub offset: usize,
    pub text: String,
    pub selection_type: SelectionType,
    pub count: usize,
    /// Re-indent the put lines (line-wise text only).
    pub indent: bool,
    pub cursor_after: bool,
    /// Sub-mode the put was issued from.
    pub sub_mode: SubMode,
}

impl PutText {
    fn from_register(register: &Register, offset: usize, count: usize, cursor_after: bool) -> Self {
        Self {
            offset,
            text: register.text.clone(),
            selection_type: register.selection_type,
            count: count.max(1),
            indent: false,
            cursor_after,
            sub_mode: SubMode::None,
        }
    }
}

/// Insert `put` into the document. Returns false when nothing was inserted
/// (line-wise put in a one-line editor, or a refused rich paste).
pub fn put_text(
    ed: &mut Editor,
    services: &Services,
    register: &Register,
    mut put: PutText,
) -> Result<bool, ActionError> {
    if put.sub_mode == SubMode::VisualLine && ed.is_one_line_mode() {
        return Ok(false);
    }
    put.indent &= put.selection_type == SelectionType::LineWise || put.sub_mode == SubMode::VisualLine;

    if put.selection_type != SelectionType::BlockWise
        && let Some(content) = register.transferable.as_deref()
    {
        debug!(target: "actions.put", register = %register.name, offset = put.offset, "put_rich");
        return paste::paste(
            ed,
            services,
            put.selection_type,
            content,
            put.indent,
            put.cursor_after,
            put.offset,
        );
    }

    if put.selection_type == SelectionType::LineWise && !put.text.is_empty() && !put.text.ends_with('\n') {
        put.text.push('\n');
    }

    let offset = put.offset.min(ed.len_chars());
    let mut end_offset = if put.selection_type == SelectionType::BlockWise {
        block::put_block(ed, offset, &put.text, put.count, put.sub_mode)?
    } else {
        let repeated = put.text.repeat(put.count);
        ed.insert_text(offset, &repeated)?;
        offset + repeated.chars().count()
    };

    if put.indent && end_offset > offset {
        let first = ed.position(offset).line;
        let last = ed.position(end_offset - 1).line;
        if services.formatter.has_language_formatting() {
            services
                .formatter
                .adjust_line_indent_range(ed, TextRange::new(offset, end_offset))?;
        }
        trace!(target: "actions.put", first, last, "put_indent");
        end_offset = ed.line_end(last);
    }

    let rule = caret::caret_rule(put.selection_type, put.sub_mode, put.cursor_after);
    let caret = caret::resolve(ed, rule, offset, end_offset);
    ed.move_caret(caret);
    ed.set_change_marks(TextRange::new(offset, end_offset));
    debug!(
        target: "actions.put",
        offset,
        end_offset,
        selection_type = ?put.selection_type,
        count = put.count,
        ?rule,
        caret,
        "put_text"
    );
    Ok(true)
}

/// `P`: put the selected register before the caret (above the caret line for
/// line-wise text).
pub fn put_text_before_cursor(
    ed: &mut Editor,
    services: &Services,
    count: usize,
    indent: bool,
    cursor_after: bool,
) -> Result<bool, ActionError> {
    let Some(register) = ed.registers.last_register() else {
        return Ok(false);
    };
    if register.selection_type == SelectionType::LineWise && ed.is_one_line_mode() {
        return Ok(false);
    }
    let offset = if register.selection_type == SelectionType::LineWise {
        ed.line_start(ed.caret_line())
    } else {
        ed.caret()
    };
    let mut put = PutText::from_register(&register, offset, count, cursor_after);
    put.indent = indent;
    put_text(ed, services, &register, put)
}

/// `p`: put the selected register after the caret (below the caret line for
/// line-wise text, adding the missing final line break first).
pub fn put_text_after_cursor(
    ed: &mut Editor,
    services: &Services,
    count: usize,
    indent: bool,
    cursor_after: bool,
) -> Result<bool, ActionError> {
    let Some(register) = ed.registers.last_register() else {
        return Ok(false);
    };
    if register.selection_type == SelectionType::LineWise && ed.is_one_line_mode() {
        return Ok(false);
    }
    let line = ed.caret_line();
    let len = ed.len_chars();
    let offset = if register.selection_type == SelectionType::LineWise {
        let mut offset = (ed.line_end(line) + 1).min(len);
        if offset == len && ed.buffer().char_at(len.saturating_sub(1)).is_some_and(|c| c != '\n') {
            ed.insert_text(len, "\n")?;
            offset = len + 1;
        }
        offset
    } else if ed.line_len(line) > 0 {
        (ed.caret() + 1).min(len)
    } else {
        ed.caret()
    };
    let mut put = PutText::from_register(&register, offset, count, cursor_after);
    put.indent = indent;
    put_text(ed, services, &register, put)
}

/// Replace the visual `range` with the selected register. The replaced text
/// is not saved, so the register survives for further puts.
pub fn put_visual_range(
    ed: &mut Editor,
    services: &Services,
    range: TextRange,
    count: usize,
    indent: bool,
    cursor_after: bool,
) -> Result<bool, ActionError> {
    let sub_mode = ed.session.sub_mode();
    let selection_type = SelectionType::from_sub_mode(sub_mode);
    let register = ed.registers.last_register();
    ed.registers.reset_register();
    let Some(register) = register else {
        return Ok(false);
    };
    if register.selection_type == SelectionType::LineWise && ed.is_one_line_mode() {
        return Ok(false);
    }

    let range = range.normalize();
    let start = range.start();
    let mut end = range.end();
    let end_line = ed.position(end).line;
    if sub_mode == SubMode::VisualLine
        && !(end > start && ed.buffer().char_at(end - 1) == Some('\n'))
    {
        end = (end + 1).min(ed.len_chars());
    }

    crate::change::delete_range(ed, TextRange::new(start, end), selection_type, false)?;
    ed.remove_selection();

    let mut pos = start;
    match (register.selection_type, selection_type) {
        (SelectionType::LineWise, SelectionType::BlockWise) => {
            let line_end = ed.line_end(end_line);
            if line_end >= ed.len_chars() {
                ed.insert_text(line_end, "\n")?;
            }
            pos = line_end + 1;
        }
        (SelectionType::LineWise, SelectionType::CharacterWise) => {
            ed.insert_text(start, "\n")?;
            pos = start + 1;
        }
        // A block over whole lines needs no extra break: the deletion kept the
        // line structure and every block row ends its own line.
        _ => {}
    }

    debug!(
        target: "actions.put",
        register = %register.name,
        register_type = ?register.selection_type,
        ?selection_type,
        pos,
        "put_visual_range"
    );
    let put = PutText {
        offset: pos,
        text: register.text.clone(),
        selection_type: register.selection_type,
        count: count.max(1),
        indent: indent && register.selection_type == SelectionType::LineWise,
        cursor_after,
        sub_mode,
    };
    put_text(ed, services, &register, put)
}

/// Store `range` in the selected register. With `move_cursor` the caret
/// goes to the start of the range.
pub fn yank_range(
    ed: &mut Editor,
    range: Option<TextRange>,
    selection_type: SelectionType,
    move_cursor: bool,
) -> bool {
    let Some(range) = range.map(|r| r.normalize()) else {
        return false;
    };
    let text = ed.range_text(range, selection_type);
    debug!(target: "actions.put", range = %range, ?selection_type, len = text.chars().count(), "yank");
    ed.registers.store(text, selection_type, false);
    if move_cursor {
        let start = match selection_type {
            SelectionType::BlockWise => ed
                .block_rows(range)
                .last()
                .map(|r| r.start())
                .unwrap_or(range.start()),
            _ => range.start(),
        };
        ed.move_caret(start);
    }
    ed.set_change_marks(range);
    true
}

/// `y{motion}`
pub fn yank_motion(ed: &mut Editor, count: usize, argument: &Argument) -> bool {
    let total = count.max(1).saturating_mul(argument.count);
    let resolved = resolve_motion(ed, argument.motion, total);
    let Some((range, selection_type)) = resolved else {
        return false;
    };
    yank_range(ed, Some(range), selection_type, true)
}

/// `yy`: yank `count` lines starting at the caret line.
pub fn yank_line(ed: &mut Editor, count: usize) -> bool {
    let line = ed.caret_line();
    let last = (line + count.max(1) - 1).min(ed.line_count().saturating_sub(1));
    let start = ed.line_start(line);
    let end = (ed.line_end(last) + 1).min(ed.len_chars());
    yank_range(ed, Some(TextRange::new(start, end)), SelectionType::LineWise, false)
}
