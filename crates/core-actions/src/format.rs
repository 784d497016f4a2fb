//! Code-style seam used by puts and the paste re-indent strategies.
//!
//! A formatter only has to say which indent a line should have; the provided
//! methods turn that into document edits. Two built-ins:
//! * [`PlainTextFormatter`] has no language formatting, so rich pastes fall
//!   back to shifting the block by the caret column,
//! * [`BraceFormatter`] indents by `{`/`}` nesting depth.

use core_config::IndentConfig;
use core_model::Editor;
use core_text::{Buffer, INDENT_CHARS, TextError, TextRange};
use tracing::trace;

pub trait Formatter {
    fn has_language_formatting(&self) -> bool;

    /// Indent (in columns) `line` should have.
    fn line_indent(&self, buffer: &Buffer, line: usize, indent: &IndentConfig) -> usize;

    /// Rewrite the leading whitespace of the line containing `offset`.
    fn adjust_line_indent(&self, editor: &mut Editor, offset: usize) -> Result<(), TextError> {
        let line = editor.buffer().line_number(offset);
        let indent = editor.indent();
        let desired = self.line_indent(editor.buffer(), line, &indent);
        let start = editor.line_start(line);
        let indent_end = editor.buffer().shift_forward(start, INDENT_CHARS);
        let current = editor.buffer().slice(TextRange::new(start, indent_end));
        let wanted = indent.fill(desired);
        if current != wanted {
            trace!(target: "actions.paste", line, desired, "adjust_line_indent");
            editor.buffer_mut().replace(TextRange::new(start, indent_end), &wanted)?;
        }
        Ok(())
    }

    /// Re-indent every non-blank line intersecting `range`.
    fn adjust_line_indent_range(&self, editor: &mut Editor, range: TextRange) -> Result<(), TextError> {
        let r = range.normalize();
        let first = editor.buffer().line_number(r.start());
        let mut last = editor.buffer().line_number(r.end());
        if r.end() > r.start() && last > first && r.end() == editor.line_start(last) {
            last -= 1;
        }
        for line in first..=last {
            if editor.buffer().line_text(line).trim().is_empty() {
                continue;
            }
            let at = editor.line_start(line);
            self.adjust_line_indent(editor, at)?;
        }
        Ok(())
    }

    /// Full reformat of `range`: indentation plus trailing whitespace.
    fn reformat_range(&self, editor: &mut Editor, range: TextRange) -> Result<(), TextError> {
        self.adjust_line_indent_range(editor, range)?;
        let r = range.normalize();
        let first = editor.buffer().line_number(r.start());
        let last = editor.buffer().line_number(r.end());
        for line in (first..=last).rev() {
            let text = editor.buffer().line_text(line);
            let trimmed = text.trim_end_matches([' ', '\t']).chars().count();
            let len = text.chars().count();
            if trimmed < len {
                let start = editor.line_start(line);
                editor
                    .buffer_mut()
                    .delete(TextRange::new(start + trimmed, start + len))?;
            }
        }
        Ok(())
    }
}

/// Keeps the indent of the closest non-blank line above.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextFormatter;

impl Formatter for PlainTextFormatter {
    fn has_language_formatting(&self) -> bool {
        false
    }

    fn line_indent(&self, buffer: &Buffer, line: usize, indent: &IndentConfig) -> usize {
        (0..line)
            .rev()
            .map(|l| buffer.line_text(l))
            .find(|t| !t.trim().is_empty())
            .map(|t| {
                let lead: String = t.chars().take_while(|c| INDENT_CHARS.contains(*c)).collect();
                indent.width_of(&lead)
            })
            .unwrap_or(0)
    }
}

/// Indents by brace nesting: each unclosed `{` above the line adds one level,
/// a line starting with `}` closes its level.
#[derive(Debug, Default, Clone, Copy)]
pub struct BraceFormatter;

impl Formatter for BraceFormatter {
    fn has_language_formatting(&self) -> bool {
        true
    }

    fn line_indent(&self, buffer: &Buffer, line: usize, indent: &IndentConfig) -> usize {
        let mut depth: isize = 0;
        for l in 0..line {
            for c in buffer.line_text(l).chars() {
                match c {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
        }
        if buffer.line_text(line).trim_start().starts_with('}') {
            depth -= 1;
        }
        depth.max(0) as usize * indent.indent_size
    }
}
