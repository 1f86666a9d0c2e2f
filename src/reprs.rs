//! Text transforms and literal-safe representations.
//!
//! A candidate string is first run through the comparison flavor's transforms
//! (pure text-to-text normalizations), then made safe for embedding inside a
//! raw triple-quoted literal. The delimiter-safe form is what gets compared
//! against the canonical baselined text, so the encoding must be stable and
//! reversible.

use thiserror::Error;

/// Triple double-quote delimiter.
pub const DOUBLE: &str = "\"\"\"";

/// Triple single-quote delimiter.
pub const SINGLE: &str = "'''";

/// Escaped form substituted for `'''` when both delimiters appear in a text.
const SINGLE_ESCAPED: &str = r"\'\'\'";

/// A pure text-to-text normalization applied before comparison.
pub type Transform = fn(&str) -> String;

/// Comparison flavor: the ordered set of transforms applied to candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flavor {
    /// Escape non-printable characters; leave everything else alone.
    #[default]
    Plain,
    /// Escape non-printable and all non-ASCII characters.
    Ascii,
    /// Strip trailing whitespace per line, then escape non-printables.
    Stripped,
}

impl Flavor {
    /// The transforms for this flavor, in application order.
    pub fn transforms(self) -> &'static [Transform] {
        match self {
            Flavor::Plain => &[escape_unprintable],
            Flavor::Ascii => &[escape_non_ascii],
            Flavor::Stripped => &[strip_trailing_whitespace, escape_unprintable],
        }
    }

    /// Apply all transforms in declared order.
    pub fn apply(self, text: &str) -> String {
        let mut out = text.to_string();
        for transform in self.transforms() {
            out = transform(&out);
        }
        out
    }
}

/// Escape a single character into `\xNN` / `\uNNNN` / `\UNNNNNNNN` notation.
fn escape_char(out: &mut String, ch: char) {
    use std::fmt::Write as _;
    let code = ch as u32;
    if code < 0x100 {
        let _ = write!(out, "\\x{code:02x}");
    } else if code < 0x10000 {
        let _ = write!(out, "\\u{code:04x}");
    } else {
        let _ = write!(out, "\\U{code:08x}");
    }
}

/// Escape non-printable characters into codepoint notation.
///
/// Newlines, quotes, and backslashes pass through untouched since the target
/// literal form is raw and triple-quoted; tab and carriage return use their
/// short escapes.
pub fn escape_unprintable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' | '"' | '\'' | '\\' => out.push(ch),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ch if ch.is_control() => escape_char(&mut out, ch),
            ch => out.push(ch),
        }
    }
    out
}

/// Escape non-printable and all non-ASCII characters into codepoint notation.
pub fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' | '"' | '\'' | '\\' => out.push(ch),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ch if ch.is_control() || !ch.is_ascii() => escape_char(&mut out, ch),
            ch => out.push(ch),
        }
    }
    out
}

/// Strip trailing whitespace from the end of each line.
pub fn strip_trailing_whitespace(text: &str) -> String {
    text.split('\n')
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReprError {
    #[error("text contains both triple-quote styles and the \\'\\'\\' substitution is ambiguous")]
    Unrepresentable,
}

/// A delimiter-safe representation of a transformed candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    /// Text safe to embed between the chosen delimiters.
    pub text: String,
    /// Chosen triple-quote delimiter ([`DOUBLE`] or [`SINGLE`]).
    pub delim: &'static str,
}

/// Make transformed text safe for embedding inside a raw triple-quoted literal.
///
/// Uses `"""` unless the text contains it, in which case `'''` is chosen.
/// When both styles are present, the `'''` occurrences are substituted with
/// `\'\'\'` (prefer-escaping policy). If the text already contains the
/// substitution sequence the encoding would be ambiguous and the text cannot
/// be represented in either style.
pub fn delimiter_safe(text: String) -> Result<Representation, ReprError> {
    if !text.contains(DOUBLE) {
        return Ok(Representation {
            text,
            delim: DOUBLE,
        });
    }

    if text.contains(SINGLE) {
        if text.contains(SINGLE_ESCAPED) {
            return Err(ReprError::Unrepresentable);
        }
        return Ok(Representation {
            text: text.replace(SINGLE, SINGLE_ESCAPED),
            delim: SINGLE,
        });
    }

    Ok(Representation {
        text,
        delim: SINGLE,
    })
}

/// Render a representation as a complete raw triple-quoted literal.
///
/// The block layout (leading/trailing newline between the delimiters) is used
/// whenever the expectation declared indentation, the text spans lines, or the
/// text ends in a backslash or quote character that would otherwise collide
/// with the closing delimiter.
pub fn render_literal(rep: &Representation, indented: bool) -> String {
    let quote = rep.delim.chars().next().unwrap_or('"');
    let multiline = indented || rep.text.contains('\n');
    if multiline || rep.text.ends_with('\\') || rep.text.ends_with(quote) {
        format!("r{delim}\n{text}\n{delim}", delim = rep.delim, text = rep.text)
    } else {
        format!("r{delim}{text}{delim}", delim = rep.delim, text = rep.text)
    }
}
