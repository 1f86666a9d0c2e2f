//! Expectation registry: one expectation per source location, plus flush.
//!
//! The registry is an explicit context object. Test harnesses construct one
//! (or use [`Registry::global`]) and flush it at a well-defined point; the
//! [`FlushGuard`] RAII helper covers suites that prefer not to call flush
//! themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use thiserror::Error;

use crate::baseline::Baseline;
use crate::canon::{self, FormatError};
use crate::patch::{Mode, PatchError, Script, UpdateNotice};
use crate::reprs::Flavor;

/// Stable identity of a baseline declaration: absolute path + 1-based line.
///
/// The patch engine locates the enclosing literal by scanning upward from the
/// recorded line, so for a multi-line literal the line must sit at or below
/// the closing delimiter, never above it. Single-line literals have opening
/// and closing delimiters on the recorded line itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    path: PathBuf,
    line: u32,
}

impl Location {
    /// Build a location key, normalizing the path to an absolute form so
    /// relative and absolute references to the same file share one key.
    pub fn new(path: impl AsRef<Path>, line: u32) -> Self {
        let path = path.as_ref();
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Location { path, line }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{path}:{line}: baseline text differs from the text previously registered at this location", path = .path.display())]
    IdentityConflict { path: PathBuf, line: u32 },

    #[error(transparent)]
    Format(#[from] FormatError),
}

fn render_failures(failures: &[(PathBuf, PatchError)]) -> String {
    failures
        .iter()
        .map(|(path, err)| format!("\n  {}: {err}", path.display()))
        .collect()
}

/// Aggregated flush failure. Every pending file is attempted before this is
/// raised; files that flushed cleanly are listed in `notices`.
#[derive(Error, Debug)]
#[error("flush failed for {} file(s):{}", .failures.len(), render_failures(.failures))]
pub struct FlushError {
    pub failures: Vec<(PathBuf, PatchError)>,
    pub notices: Vec<UpdateNotice>,
}

/// Live table of expectations keyed by source location.
#[derive(Debug, Default)]
pub struct Registry {
    instances: Mutex<BTreeMap<Location, Baseline>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Process-wide convenience registry for plain `#[test]` usage via the
    /// [`baseline!`](crate::baseline!) family of macros.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Get or create the [`Flavor::Plain`] expectation at `location`.
    pub fn get_or_create(
        &self,
        location: Location,
        raw_text: &str,
    ) -> Result<Baseline, RegistryError> {
        self.get_or_create_with(location, raw_text, Flavor::Plain)
    }

    /// Get or create the expectation at `location` with an explicit flavor.
    ///
    /// The raw text is canonicalized on first construction; text and
    /// indentation are fixed from then on. Re-construction with raw text
    /// whose canonical form disagrees with the stored one fails fast, since
    /// the call site's literal contract changed without a matching update.
    pub fn get_or_create_with(
        &self,
        location: Location,
        raw_text: &str,
        flavor: Flavor,
    ) -> Result<Baseline, RegistryError> {
        let canonical = canon::dedent(raw_text)?;

        let mut instances = self.instances.lock().expect("registry table poisoned");

        if let Some(existing) = instances.get(&location) {
            if *existing.canonical() != canonical {
                return Err(RegistryError::IdentityConflict {
                    path: location.path,
                    line: location.line,
                });
            }
            return Ok(existing.clone());
        }

        let baseline = Baseline::new(
            location.path.clone(),
            location.line,
            canonical,
            flavor,
        );
        instances.insert(location, baseline.clone());
        Ok(baseline)
    }

    fn dirty(&self) -> Vec<Baseline> {
        self.instances
            .lock()
            .expect("registry table poisoned")
            .values()
            .filter(|baseline| baseline.is_dirty())
            .cloned()
            .collect()
    }

    /// Whether any expectation has recorded a mismatch since the last reset.
    pub fn has_pending_updates(&self) -> bool {
        !self.dirty().is_empty()
    }

    fn pending_scripts(&self) -> BTreeMap<PathBuf, Script> {
        let mut scripts: BTreeMap<PathBuf, Script> = BTreeMap::new();
        for baseline in self.dirty() {
            scripts
                .entry(baseline.path().to_path_buf())
                .or_insert_with(|| Script::new(baseline.path()))
                .add_update(baseline.line(), baseline.render_update());
        }
        scripts
    }

    /// Materialize every pending mismatch into rewritten file content.
    ///
    /// Groups dirty expectations per file and applies their updates in
    /// descending line order. Nothing is written to disk; callers inspect the
    /// returned scripts (via [`Script::content`]) or persist them. A failure
    /// in one file does not stop the others; failures are aggregated.
    pub fn flush(&self) -> Result<BTreeMap<PathBuf, Script>, FlushError> {
        let mut rewritten = BTreeMap::new();
        let mut failures = Vec::new();

        for (path, mut script) in self.pending_scripts() {
            match script.update() {
                Ok(()) => {
                    rewritten.insert(path, script);
                }
                Err(err) => failures.push((path, err)),
            }
        }

        if failures.is_empty() {
            Ok(rewritten)
        } else {
            Err(FlushError {
                failures,
                notices: Vec::new(),
            })
        }
    }

    /// Flush and persist every pending file in the given mode.
    ///
    /// Files that rewrite cleanly are written even when other files fail;
    /// the aggregated error carries the notices for the files that were
    /// written.
    pub fn flush_and_write(&self, mode: Mode) -> Result<Vec<UpdateNotice>, FlushError> {
        let mut notices = Vec::new();
        let mut failures = Vec::new();

        for (path, mut script) in self.pending_scripts() {
            let result = script.update().and_then(|()| script.write(mode));
            match result {
                Ok(notice) => notices.push(notice),
                Err(err) => failures.push((path, err)),
            }
        }

        if failures.is_empty() {
            Ok(notices)
        } else {
            Err(FlushError { failures, notices })
        }
    }

    /// Drop every registered expectation and its recorded mismatches.
    /// Harness hook for isolation between runs.
    pub fn reset(&self) {
        self.instances
            .lock()
            .expect("registry table poisoned")
            .clear();
    }

    /// RAII guard that flushes this registry in `mode` when dropped.
    pub fn flush_on_drop(&self, mode: Mode) -> FlushGuard<'_> {
        FlushGuard {
            registry: self,
            mode,
        }
    }
}

/// Best-effort end-of-run flush: writes pending updates when dropped and
/// reports the outcome on stderr. Prefer an explicit
/// [`Registry::flush_and_write`] call at a well-defined point; the guard is
/// the convenience default for suites without a teardown hook.
#[must_use = "the guard flushes on drop; binding it to _ drops it immediately"]
pub struct FlushGuard<'a> {
    registry: &'a Registry,
    mode: Mode,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        match self.registry.flush_and_write(self.mode) {
            Ok(notices) => {
                for notice in notices {
                    eprintln!("UPDATE: {notice}");
                }
            }
            Err(err) => {
                for notice in &err.notices {
                    eprintln!("UPDATE: {notice}");
                }
                eprintln!("baseline {err}");
            }
        }
    }
}

/// Construct (or fetch) a plain baseline registered at the macro call site.
///
/// `line!()` records the invocation's first line, and the located region must
/// close at or above the recorded line, so the whole invocation has to sit on
/// one source line when its literal is meant to be rewritten in place. Build a
/// [`Location`](crate::Location) pointing at the closing delimiter explicitly
/// for multi-line blocks.
///
/// Panics on a malformed literal or an identity conflict; both are fatal
/// configuration errors at the declaration, never comparison failures.
#[macro_export]
macro_rules! baseline {
    ($raw:expr) => {
        $crate::Registry::global()
            .get_or_create($crate::Location::new(file!(), line!()), $raw)
            .unwrap_or_else(|e| panic!("baseline declaration invalid: {e}"))
    };
}

/// Construct (or fetch) an ASCII-escaping baseline at the macro call site.
/// Same call-site line contract as [`baseline!`](crate::baseline!).
#[macro_export]
macro_rules! ascii_baseline {
    ($raw:expr) => {
        $crate::Registry::global()
            .get_or_create_with(
                $crate::Location::new(file!(), line!()),
                $raw,
                $crate::Flavor::Ascii,
            )
            .unwrap_or_else(|e| panic!("baseline declaration invalid: {e}"))
    };
}

/// Construct (or fetch) a trailing-whitespace-insensitive baseline at the
/// macro call site. Same call-site line contract as
/// [`baseline!`](crate::baseline!).
#[macro_export]
macro_rules! stripped_baseline {
    ($raw:expr) => {
        $crate::Registry::global()
            .get_or_create_with(
                $crate::Location::new(file!(), line!()),
                $raw,
                $crate::Flavor::Stripped,
            )
            .unwrap_or_else(|e| panic!("baseline declaration invalid: {e}"))
    };
}
