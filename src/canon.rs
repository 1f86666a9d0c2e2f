use thiserror::Error;

/// Canonical form of a baselined text block.
///
/// Multi-line blocks are written in source files with a blank first line, a
/// trailing line holding only the common indentation, and every inner line
/// indented by at least that much. Canonicalization validates that contract
/// and strips the decoration so comparisons see the bare text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// Dedented text (inner lines only for multi-line input).
    pub text: String,
    /// Common indentation width in characters (0 for single-line input).
    pub indent: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("when multiple lines, first line must be blank")]
    NonBlankFirstLine,

    #[error("last line must only contain indent whitespace")]
    NonBlankLastLine,

    #[error("line {line} indented less than the {indent} character indent of the last line")]
    UnderIndented { line: usize, indent: usize },
}

/// Validate and dedent a raw baselined text block.
///
/// Single-line input passes through unchanged with indent 0. Multi-line input
/// must follow the blank-first-line / indent-only-last-line convention; the
/// common indent (taken from the last line) is stripped from every inner line
/// and the first and last lines are dropped.
pub fn dedent(raw: &str) -> Result<Canonical, FormatError> {
    let lines: Vec<&str> = raw.split('\n').collect();

    if lines.len() == 1 {
        return Ok(Canonical {
            text: raw.to_string(),
            indent: 0,
        });
    }

    if !lines[0].trim().is_empty() {
        return Err(FormatError::NonBlankFirstLine);
    }

    let last = lines[lines.len() - 1];
    if !last.trim().is_empty() {
        return Err(FormatError::NonBlankLastLine);
    }

    let indent = last.chars().count();

    for (index, line) in lines.iter().enumerate() {
        let lead: String = line.chars().take(indent).collect();
        if !lead.trim().is_empty() {
            return Err(FormatError::UnderIndented {
                line: index + 1,
                indent,
            });
        }
    }

    let inner: Vec<String> = lines[1..lines.len() - 1]
        .iter()
        .map(|line| line.chars().skip(indent).collect())
        .collect();

    Ok(Canonical {
        text: inner.join("\n"),
        indent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_passes_through() {
        let canon = dedent("SINGLE").unwrap();
        assert_eq!(canon.text, "SINGLE");
        assert_eq!(canon.indent, 0);
    }

    #[test]
    fn multi_line_strips_common_indent() {
        let canon = dedent("\n    LINE 1\n    LINE 2\n        LINE 3\n    ").unwrap();
        assert_eq!(canon.text, "LINE 1\nLINE 2\n    LINE 3");
        assert_eq!(canon.indent, 4);
    }

    #[test]
    fn zero_indent_multi_line() {
        let canon = dedent("\nline=1\n    line=2\n\nline=4\n").unwrap();
        assert_eq!(canon.text, "line=1\n    line=2\n\nline=4");
        assert_eq!(canon.indent, 0);
    }

    #[test]
    fn blank_inner_lines_are_allowed() {
        // A fully blank inner line is shorter than the indent; that's fine.
        let canon = dedent("\n    WHITESPACE\n\n    ").unwrap();
        assert_eq!(canon.text, "WHITESPACE\n");
        assert_eq!(canon.indent, 4);
    }

    #[test]
    fn non_blank_first_line_rejected() {
        let err = dedent("oops\n    X\n    ").unwrap_err();
        assert_eq!(err, FormatError::NonBlankFirstLine);
    }

    #[test]
    fn non_blank_last_line_rejected() {
        let err = dedent("\n    X\n    trailing").unwrap_err();
        assert_eq!(err, FormatError::NonBlankLastLine);
    }

    #[test]
    fn under_indented_line_rejected() {
        let err = dedent("\n    X\n  Y\n    ").unwrap_err();
        assert_eq!(
            err,
            FormatError::UnderIndented {
                line: 3,
                indent: 4
            }
        );
    }

    #[test]
    fn empty_string_is_single_line() {
        let canon = dedent("").unwrap();
        assert_eq!(canon.text, "");
        assert_eq!(canon.indent, 0);
    }
}
