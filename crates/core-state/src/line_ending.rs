//! Line separator detection for text arriving from outside the editor.
//!
//! Documents only ever hold `\n`. Clipboard payloads and pre-processor output
//! may carry `\r\n` or lone `\r`; the paste pipeline runs them through
//! [`normalize_line_endings`] before inserting.

/// Separator style observed in foreign text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Text rewritten to `\n` separators plus what was found in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub normalized: String,
    /// Most frequent style; ties prefer CRLF, then LF, then CR.
    pub original: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed: bool,
}

impl NormalizedText {
    /// True when the input already used `\n` exclusively.
    pub fn unchanged(&self) -> bool {
        !self.mixed && self.original == LineEnding::Lf
    }
}

pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                crlf += 1;
                out.push('\n');
            }
            '\r' => {
                cr += 1;
                out.push('\n');
            }
            '\n' => {
                lf += 1;
                out.push('\n');
            }
            other => out.push(other),
        }
    }

    let counts = [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ];
    let mut original = LineEnding::Lf;
    let mut max = 0usize;
    for (style, count) in counts {
        if count > max {
            max = count;
            original = style;
        }
    }
    let styles_seen = counts.iter().filter(|(_, n)| *n > 0).count();

    NormalizedText {
        had_trailing_newline: input.ends_with('\n') || input.ends_with('\r'),
        normalized: out,
        original,
        mixed: styles_seen > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_becomes_lf() {
        let n = normalize_line_endings("a\r\nb\r\n");
        assert_eq!(n.normalized, "a\nb\n");
        assert_eq!(n.original, LineEnding::Crlf);
        assert!(n.had_trailing_newline);
        assert!(!n.mixed);
    }

    #[test]
    fn lone_cr_and_mixed_input() {
        let n = normalize_line_endings("x\ry\r\nz\r");
        assert_eq!(n.normalized, "x\ny\nz\n");
        assert_eq!(n.original, LineEnding::Cr);
        assert!(n.mixed);
    }

    #[test]
    fn multibyte_text_survives() {
        let n = normalize_line_endings("é\r\nß");
        assert_eq!(n.normalized, "é\nß");
        assert!(!n.had_trailing_newline);
    }

    #[test]
    fn plain_lf_is_unchanged() {
        let n = normalize_line_endings("one\ntwo");
        assert!(n.unchanged());
        assert_eq!(n.normalized, "one\ntwo");
    }
}
