//! Rich clipboard paste.
//!
//! Used for registers that carry a clipboard payload rather than plain text.
//! The pipeline mirrors an IDE paste: line separators are normalized, paste
//! pre-processors may rewrite the text, post-processors get their extracted
//! data once the text is in, and the pasted block is re-indented with one of
//! the [`ReformatOnPaste`] strategies. The whole insertion runs with guarded
//! block checking on; a write into a guarded block is reported to the UI and
//! abandons the rest of the paste.

mod indent;

use core_config::ReformatOnPaste;
use core_model::Editor;
use core_state::{SelectionType, Transferable, normalize_line_endings};
use core_text::{MarkerId, TextError, TextRange, WHITESPACE_CHARS};
use tracing::{debug, warn};

use crate::ActionError;
use crate::host::Services;

/// Paste `content` at `offset`. Returns false when a guard refused the paste
/// (read-only editor, multiple carets, column selection, unreadable
/// clipboard) or a guarded block rejected it.
///
/// `cursor_after` is only logged here: the text always goes in at `offset`
/// and the caret is left where the re-indent strategy put it, unlike the
/// plain register put which applies the caret table.
pub fn paste(
    ed: &mut Editor,
    services: &Services,
    selection_type: SelectionType,
    content: &dyn Transferable,
    indent: bool,
    cursor_after: bool,
    offset: usize,
) -> Result<bool, ActionError> {
    if !ed.is_writable() {
        debug!(target: "actions.paste", "paste_refused_read_only");
        return Ok(false);
    }
    if ed.caret_count() > 1 || ed.is_column_mode() {
        debug!(target: "actions.paste", carets = ed.caret_count(), column_mode = ed.is_column_mode(), "paste_refused_carets");
        return Ok(false);
    }

    ed.buffer_mut().start_guarded_block_checking();
    let result = do_paste(ed, services, selection_type, content, indent, cursor_after, offset);
    ed.buffer_mut().stop_guarded_block_checking();

    match result {
        Err(ActionError::Text(error @ TextError::ReadOnlyFragment { .. })) => {
            services.ui.read_only_fragment(&error);
            Ok(false)
        }
        other => other,
    }
}

fn do_paste(
    ed: &mut Editor,
    services: &Services,
    selection_type: SelectionType,
    content: &dyn Transferable,
    indent: bool,
    cursor_after: bool,
    offset: usize,
) -> Result<bool, ActionError> {
    let text = match content.string_data() {
        Ok(text) => text,
        Err(error) => {
            warn!(target: "actions.paste", %error, "clipboard_unreadable");
            services.ui.beep();
            return Ok(false);
        }
    };

    if selection_type == SelectionType::LineWise
        && let Some((range, _)) = ed.visual_range()
    {
        ed.delete_text(range)?;
        ed.remove_selection();
    }
    let offset = offset.min(ed.len_chars());
    ed.move_caret(offset);

    let extracted: Vec<(usize, String)> = services
        .post_processors
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.extract_transferable_data(content).map(|d| (i, d)))
        .collect();

    let normalized = normalize_line_endings(&text);
    if !normalized.unchanged() {
        debug!(target: "actions.paste", original = ?normalized.original, mixed = normalized.mixed, "line_endings_normalized");
    }
    let text = normalized.normalized;

    let col = ed.caret_position().column;
    let caret_offset = ed.caret();
    let anchor_column = match ed.selection_bounds() {
        Some((start, _)) if caret_offset >= start => ed.position(start).column,
        _ => col,
    };

    let raw = content.raw_text();
    let processed = services
        .pre_processors
        .iter()
        .fold(text.clone(), |t, p| p.preprocess_on_paste(ed, &t, raw.as_deref()));

    let mut strategy = if processed == text {
        services.config.paste().reformat_on_paste
    } else {
        ReformatOnPaste::ReformatBlock
    };
    if !services.formatter.has_language_formatting() && strategy != ReformatOnPaste::NoReformat {
        strategy = ReformatOnPaste::IndentBlock;
    }
    let text = processed;

    ed.remove_selection();
    ed.insert_text(offset, &text)?;
    let length = text.chars().count();
    let bounds = ed
        .buffer_mut()
        .create_range_marker(TextRange::new(offset, offset + length));
    debug!(
        target: "actions.paste",
        offset,
        length,
        ?strategy,
        indent,
        cursor_after,
        "pasted"
    );

    let outcome = reindent(
        ed,
        services,
        bounds,
        &extracted,
        Reindent {
            strategy,
            selection_type,
            offset,
            length,
            caret_offset,
            anchor_column,
        },
    );
    if let Some(range) = ed.buffer().marker(bounds) {
        ed.set_last_pasted_region(range);
    }
    ed.buffer_mut().release_marker(bounds);
    outcome.map(|()| true)
}

struct Reindent {
    strategy: ReformatOnPaste,
    selection_type: SelectionType,
    offset: usize,
    length: usize,
    caret_offset: usize,
    anchor_column: usize,
}

/// Post-processors, then the re-indent strategy over the live pasted range.
fn reindent(
    ed: &mut Editor,
    services: &Services,
    bounds: MarkerId,
    extracted: &[(usize, String)],
    job: Reindent,
) -> Result<(), ActionError> {
    let mut indented = false;
    for (i, data) in extracted {
        let Some(range) = ed.buffer().marker(bounds) else {
            break;
        };
        if services.post_processors[*i].process_transferable_data(ed, range, job.caret_offset, data)? {
            indented = true;
        }
    }

    let Some(range) = ed.buffer().marker(bounds) else {
        return Ok(());
    };
    let whitespace_only = ed.buffer().shift_forward(range.start(), WHITESPACE_CHARS) >= range.end();
    let too_large = ed.len_chars() > services.config.paste().max_reformat_chars;
    if whitespace_only || too_large {
        debug!(target: "actions.paste", whitespace_only, too_large, "reindent_skipped");
        return Ok(());
    }

    match job.strategy {
        ReformatOnPaste::NoReformat => {}
        ReformatOnPaste::IndentBlock => {
            if !indented {
                indent::indent_block(ed, services, range.start(), range.end(), job.anchor_column)?;
            }
        }
        ReformatOnPaste::IndentEachLine => {
            if !indented {
                let caret = if job.selection_type == SelectionType::LineWise {
                    ed.first_non_blank(job.offset)
                } else {
                    job.offset + job.length
                };
                ed.move_caret(caret);
                indent::indent_each_line(ed, services, range.start(), range.end())?;
            }
        }
        ReformatOnPaste::ReformatBlock => {
            indent::indent_each_line(ed, services, range.start(), range.end())?;
            if let Some(range) = ed.buffer().marker(bounds) {
                services.formatter.reformat_range(ed, range)?;
            }
        }
    }
    Ok(())
}
