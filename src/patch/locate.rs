//! Literal-region location within a file's line sequence.
//!
//! The recorded line number for an expectation sits on or below the closing
//! delimiter of its source literal. Locating scans upward counting delimiter
//! occurrences until the opening delimiter is reached, then matches the region
//! with a single non-greedy pattern so the prefix and suffix text on the
//! boundary lines survive the rewrite.

use std::sync::OnceLock;

use regex::Regex;

use crate::reprs::{DOUBLE, SINGLE};

/// A located triple-quoted literal region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// 0-based index of the first line of the region.
    pub start: usize,
    /// Delimiter the literal uses ([`DOUBLE`] or [`SINGLE`]).
    pub delim: &'static str,
    /// Text before the opening delimiter (may span lines above the literal).
    pub prefix: String,
    /// Text between the delimiters.
    pub body: String,
    /// Text after the closing delimiter through end of file.
    pub suffix: String,
}

/// Region pattern for a known delimiter: prefix, optional raw marker, opening
/// delimiter, non-greedy body, closing delimiter, suffix. The delimiter is
/// interpolated rather than captured because the `regex` crate has no
/// backreferences.
fn region_regex(delim: &'static str) -> &'static Regex {
    static DOUBLE_RE: OnceLock<Regex> = OnceLock::new();
    static SINGLE_RE: OnceLock<Regex> = OnceLock::new();

    let cell = if delim == DOUBLE { &DOUBLE_RE } else { &SINGLE_RE };
    cell.get_or_init(|| {
        let pattern = format!(
            "(?s)^(?P<prefix>.*?)[rR]?{delim}(?P<body>.*?){delim}(?P<suffix>.*)$"
        );
        Regex::new(&pattern).expect("static literal-region pattern must compile")
    })
}

/// Find the start of the enclosing triple-quoted literal for a 1-based line
/// number and match the region around it.
///
/// Scans upward from `linenum`; the first line containing a delimiter decides
/// which style encloses the region (whichever occurs later on that line was
/// opened most recently). Returns `None` when no enclosing literal exists,
/// e.g. when the recorded line number is stale after unrelated edits.
pub fn locate_literal_region(lines: &[String], linenum: u32) -> Option<Region> {
    let limit = (linenum as usize).min(lines.len());

    let mut delim: Option<&'static str> = None;
    let mut count = 0;
    let mut start = None;

    for index in (0..limit).rev() {
        let line = &lines[index];

        if delim.is_none() {
            let single = line.rfind(SINGLE);
            let double = line.rfind(DOUBLE);
            delim = match (double, single) {
                (Some(d), Some(s)) => Some(if d > s { DOUBLE } else { SINGLE }),
                (Some(_), None) => Some(DOUBLE),
                (None, Some(_)) => Some(SINGLE),
                (None, None) => continue,
            };
        }

        let delim = delim?;
        count += line.matches(delim).count();
        if count >= 2 {
            start = Some((index, delim));
            break;
        }
    }

    let (start, delim) = start?;
    let tail = lines[start..].join("\n");
    let caps = region_regex(delim).captures(&tail)?;

    Some(Region {
        start,
        delim,
        prefix: caps["prefix"].to_string(),
        body: caps["body"].to_string(),
        suffix: caps["suffix"].to_string(),
    })
}

/// Replace the body of the literal enclosing `linenum` with `update`,
/// returning the new line sequence. The update text replaces everything
/// between the located prefix and suffix, delimiters included, so the caller
/// supplies a complete literal (or stack of literals).
pub fn apply_update(lines: &[String], linenum: u32, update: &str) -> Option<Vec<String>> {
    let region = locate_literal_region(lines, linenum)?;

    let new_content = format!("{}{}{}", region.prefix, update, region.suffix);

    let mut out: Vec<String> = lines[..region.start].to_vec();
    out.extend(new_content.split('\n').map(String::from));
    Some(out)
}
