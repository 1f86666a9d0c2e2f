//! The baselined expectation value and its comparator.
//!
//! A [`Baseline`] is a shared handle to a single expectation registered at one
//! source location. Comparing a candidate string against it applies the
//! flavor's transforms, produces a delimiter-safe representation, and tests
//! exact equality against the canonical stored text. Mismatched candidates are
//! recorded as ready-to-splice literals for the flush step.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::canon::Canonical;
use crate::reprs::{self, Flavor, ReprError};

#[derive(Debug)]
struct BaselineInner {
    path: PathBuf,
    line: u32,
    canonical: Canonical,
    flavor: Flavor,
    /// Rendered replacement literals for every mismatched candidate.
    /// Sorted and deduplicated so flushed output is call-order independent.
    updates: Mutex<BTreeSet<String>>,
}

/// A baselined string expectation bound to one source location.
///
/// Cloning is cheap and shares the underlying expectation; every construction
/// at the same (path, line) through a registry yields handles to the same
/// instance.
#[derive(Debug, Clone)]
pub struct Baseline {
    inner: Arc<BaselineInner>,
}

impl Baseline {
    pub(crate) fn new(path: PathBuf, line: u32, canonical: Canonical, flavor: Flavor) -> Self {
        Baseline {
            inner: Arc::new(BaselineInner {
                path,
                line,
                canonical,
                flavor,
                updates: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// Absolute path of the file the expectation was declared in.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// 1-based line number of the declaration.
    pub fn line(&self) -> u32 {
        self.inner.line
    }

    /// Declared indentation width of the source literal.
    pub fn indent(&self) -> usize {
        self.inner.canonical.indent
    }

    /// The canonical (dedented) stored text.
    pub fn as_str(&self) -> &str {
        &self.inner.canonical.text
    }

    /// Whether `a` and `b` share the same underlying expectation.
    pub fn same_instance(a: &Baseline, b: &Baseline) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn canonical(&self) -> &Canonical {
        &self.inner.canonical
    }

    /// Compare a candidate string against the canonical stored text.
    ///
    /// The candidate is run through the flavor's transforms and made
    /// delimiter-safe; equality is exact string equality between that
    /// representation and the canonical text. A mismatch records the rendered
    /// replacement literal and marks the expectation dirty; an equal
    /// comparison has no side effects.
    pub fn compare(&self, candidate: &str) -> Result<bool, ReprError> {
        let transformed = self.inner.flavor.apply(candidate);
        let rep = reprs::delimiter_safe(transformed)?;

        let is_equal = rep.text == self.inner.canonical.text;
        if !is_equal {
            self.record_mismatch(reprs::render_literal(&rep, self.indent() > 0));
        }

        Ok(is_equal)
    }

    /// Record a rendered replacement literal for a mismatched candidate,
    /// marking the expectation dirty until the next flush or reset.
    pub fn record_mismatch(&self, literal: String) {
        self.inner
            .updates
            .lock()
            .expect("baseline update set poisoned")
            .insert(literal);
    }

    /// Whether any comparison against this expectation has mismatched.
    pub fn is_dirty(&self) -> bool {
        !self
            .inner
            .updates
            .lock()
            .expect("baseline update set poisoned")
            .is_empty()
    }

    /// The complete replacement block for the source literal.
    ///
    /// Stacks every recorded literal (sorted, one per line group), re-indents
    /// each line to the declared indent, strips trailing whitespace, and drops
    /// the leading indent of the first line since the splice point already
    /// sits after the original prefix.
    pub fn render_update(&self) -> String {
        let updates = self
            .inner
            .updates
            .lock()
            .expect("baseline update set poisoned");
        let joined = updates.iter().cloned().collect::<Vec<_>>().join("\n");

        let indent = " ".repeat(self.indent());
        let lines: Vec<String> = joined
            .split('\n')
            .map(|line| format!("{indent}{line}").trim_end().to_string())
            .collect();

        lines.join("\n").trim_start().to_string()
    }
}

impl Deref for Baseline {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compare_or_panic(baseline: &Baseline, candidate: &str) -> bool {
    match baseline.compare(candidate) {
        Ok(is_equal) => is_equal,
        Err(e) => panic!(
            "baseline comparison at {}:{} failed: {e}",
            baseline.path().display(),
            baseline.line()
        ),
    }
}

impl PartialEq<str> for Baseline {
    fn eq(&self, other: &str) -> bool {
        compare_or_panic(self, other)
    }
}

impl PartialEq<&str> for Baseline {
    fn eq(&self, other: &&str) -> bool {
        compare_or_panic(self, other)
    }
}

impl PartialEq<String> for Baseline {
    fn eq(&self, other: &String) -> bool {
        compare_or_panic(self, other)
    }
}

impl PartialEq<Baseline> for str {
    fn eq(&self, other: &Baseline) -> bool {
        compare_or_panic(other, self)
    }
}

impl PartialEq<Baseline> for &str {
    fn eq(&self, other: &Baseline) -> bool {
        compare_or_panic(other, self)
    }
}

impl PartialEq<Baseline> for String {
    fn eq(&self, other: &Baseline) -> bool {
        compare_or_panic(other, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon;

    fn baseline(raw: &str, flavor: Flavor) -> Baseline {
        let canonical = canon::dedent(raw).unwrap();
        Baseline::new(PathBuf::from("/tmp/fixture.rs"), 1, canonical, flavor)
    }

    #[test]
    fn equal_comparison_is_side_effect_free() {
        let b = baseline("SINGLE", Flavor::Plain);
        assert!(b.compare("SINGLE").unwrap());
        assert!(b.compare("SINGLE").unwrap());
        assert!(!b.is_dirty());
    }

    #[test]
    fn multi_line_equal_comparison() {
        let b = baseline("\n    LINE 1\n    LINE 2\n        LINE 3\n    ", Flavor::Plain);
        assert!(b.compare("LINE 1\nLINE 2\n    LINE 3").unwrap());
        assert!(!b.is_dirty());
    }

    #[test]
    fn mismatch_records_update() {
        let b = baseline("SINGLE", Flavor::Plain);
        assert!(!b.compare("SINGLE+").unwrap());
        assert!(b.is_dirty());
        assert_eq!(b.render_update(), "r\"\"\"SINGLE+\"\"\"");
    }

    #[test]
    fn varying_mismatches_stack_sorted() {
        let b = baseline("ORIGINAL", Flavor::Plain);
        assert!(!b.compare("ZETA").unwrap());
        assert!(!b.compare("ALPHA").unwrap());
        assert_eq!(
            b.render_update(),
            "r\"\"\"ALPHA\"\"\"\nr\"\"\"ZETA\"\"\""
        );
    }

    #[test]
    fn duplicate_mismatches_deduplicate() {
        let b = baseline("ORIGINAL", Flavor::Plain);
        assert!(!b.compare("NEW").unwrap());
        assert!(!b.compare("NEW").unwrap());
        assert_eq!(b.render_update(), "r\"\"\"NEW\"\"\"");
    }

    #[test]
    fn indented_update_uses_block_layout() {
        let b = baseline("\n    LINE 1\n    LINE 2\n    ", Flavor::Plain);
        assert!(!b.compare("LINE 1+\nLINE 2+").unwrap());
        assert_eq!(
            b.render_update(),
            "r\"\"\"\n    LINE 1+\n    LINE 2+\n    \"\"\""
        );
    }

    #[test]
    fn trailing_quote_forces_block_layout() {
        let b = baseline("ENDSWITH", Flavor::Plain);
        assert!(!b.compare("ENDSWITH \"").unwrap());
        assert_eq!(b.render_update(), "r\"\"\"\nENDSWITH \"\n\"\"\"");
    }

    #[test]
    fn nul_matches_escaped_canonical_under_plain() {
        let b = baseline(r"SPECIAL [\x00]", Flavor::Plain);
        assert!(b.compare("SPECIAL [\u{0}]").unwrap());
    }

    #[test]
    fn ascii_flavor_matches_escaped_unicode() {
        let b = baseline(r"SPECIAL [Witaj \u015bwiecie!]", Flavor::Ascii);
        assert!(b.compare("SPECIAL [Witaj świecie!]").unwrap());
    }

    #[test]
    fn stripped_flavor_ignores_trailing_whitespace() {
        let b = baseline("\n    LINE 1\n    LINE 2\n    ", Flavor::Stripped);
        assert!(b.compare("LINE 1   \nLINE 2  ").unwrap());
    }

    #[test]
    fn both_delimiters_compare_via_substitution() {
        // Canonical text as it appears (raw) in the source literal.
        let b = baseline(r#"SPECIAL [\'\'\'],["""]"#, Flavor::Plain);
        assert!(b.compare(r#"SPECIAL ['''],["""]"#).unwrap());
    }

    #[test]
    fn partial_eq_sugar() {
        let b = baseline("SINGLE", Flavor::Plain);
        assert!(b == "SINGLE");
        assert!("SINGLE" == b);
        assert!(b != "SINGLE+");
    }

    #[test]
    fn deref_exposes_canonical_text() {
        let b = baseline("\n    LINE 1\n    LINE 2\n    ", Flavor::Plain);
        assert_eq!(b.len(), "LINE 1\nLINE 2".len());
        assert_eq!(b.to_string(), "LINE 1\nLINE 2");
    }
}
