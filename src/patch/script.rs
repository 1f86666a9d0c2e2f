//! Per-file pending edits and their persistence.
//!
//! A [`Script`] accumulates replacement blocks keyed by line number for one
//! source file, applies them in strictly descending line order so earlier
//! line numbers stay valid while later regions shift, and persists the result
//! either beside the original (`.update` proposal) or over it.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::patch::errors::PatchError;
use crate::patch::locate;

/// Persistence mode for a rewritten file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write a `<stem>.update.<ext>` proposal beside the original.
    Copy,
    /// Overwrite the original in place.
    Overwrite,
}

/// Human-readable record of one persisted rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    /// File the expectations were declared in.
    pub original: PathBuf,
    /// File the rewritten content was written to.
    pub written: PathBuf,
}

impl fmt::Display for UpdateNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            showpath(&self.original),
            showpath(&self.written)
        )
    }
}

/// Display a path relative to the current directory when it is beneath it.
pub fn showpath(path: &Path) -> String {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => return path.display().to_string(),
    };
    match path.strip_prefix(&cwd) {
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// Pending edits for one source file.
#[derive(Debug)]
pub struct Script {
    path: PathBuf,
    /// Lazily loaded file content as a `\n`-separated line sequence.
    lines: Option<Vec<String>>,
    /// Replacement block per 1-based line number.
    updates: BTreeMap<u32, String>,
}

impl Script {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Script {
            path: path.into(),
            lines: None,
            updates: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a replacement block for the literal enclosing `linenum`.
    pub fn add_update(&mut self, linenum: u32, update: String) {
        self.updates.insert(linenum, update);
    }

    fn ensure_loaded(&mut self) -> Result<&mut Vec<String>, PatchError> {
        if self.lines.is_none() {
            let content = fs::read_to_string(&self.path).map_err(|source| PatchError::Io {
                path: self.path.clone(),
                source,
            })?;
            self.lines = Some(content.split('\n').map(String::from).collect());
        }
        Ok(self.lines.as_mut().expect("lines were just loaded"))
    }

    /// Apply all queued updates to the in-memory line sequence.
    ///
    /// Updates are applied last-to-first so each splice only shifts content
    /// at or below its own start line.
    pub fn update(&mut self) -> Result<(), PatchError> {
        self.ensure_loaded()?;

        let pending: Vec<(u32, String)> = self
            .updates
            .iter()
            .rev()
            .map(|(&line, update)| (line, update.clone()))
            .collect();

        for (linenum, update) in pending {
            let lines = self.lines.as_mut().expect("lines loaded by ensure_loaded");
            let rewritten = locate::apply_update(lines, linenum, &update).ok_or(
                PatchError::LiteralNotFound {
                    path: self.path.clone(),
                    line: linenum,
                },
            )?;
            *lines = rewritten;
        }

        Ok(())
    }

    /// Rewritten file content. Deterministic for a given set of updates.
    pub fn content(&mut self) -> Result<String, PatchError> {
        Ok(self.ensure_loaded()?.join("\n"))
    }

    /// Path of the `.update` proposal file for this script.
    pub fn update_path(&self) -> PathBuf {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.path.with_extension(format!("update.{ext}")),
            None => {
                let mut name = self.path.as_os_str().to_os_string();
                name.push(".update");
                PathBuf::from(name)
            }
        }
    }

    /// Persist the rewritten content.
    ///
    /// `Mode::Copy` writes the proposal file beside the original;
    /// `Mode::Overwrite` replaces the original atomically and touches its
    /// mtime so incremental build tools notice the change.
    pub fn write(&mut self, mode: Mode) -> Result<UpdateNotice, PatchError> {
        let content = self.content()?;

        let target = match mode {
            Mode::Copy => self.update_path(),
            Mode::Overwrite => self.path.clone(),
        };

        atomic_write(&target, content.as_bytes()).map_err(|source| PatchError::Io {
            path: target.clone(),
            source,
        })?;

        if mode == Mode::Overwrite {
            let now = filetime::FileTime::now();
            filetime::set_file_mtime(&target, now).map_err(|source| PatchError::Io {
                path: target.clone(),
                source,
            })?;
        }

        Ok(UpdateNotice {
            original: self.path.clone(),
            written: target,
        })
    }
}

/// Atomic file write: tempfile in the same directory + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn single_update_rewrites_literal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "fixture.rs",
            "let x = baseline!(r\"\"\"SINGLE\"\"\");\n",
        );

        let mut script = Script::new(&path);
        script.add_update(1, "r\"\"\"SINGLE+\"\"\"".to_string());
        script.update().unwrap();

        assert_eq!(
            script.content().unwrap(),
            "let x = baseline!(r\"\"\"SINGLE+\"\"\");\n"
        );
    }

    #[test]
    fn updates_apply_in_descending_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "fixture.rs",
            concat!(
                "let a = baseline!(r\"\"\"FIRST\"\"\");\n",
                "let b = baseline!(r\"\"\"SECOND\"\"\");\n",
            ),
        );

        let mut script = Script::new(&path);
        // A growing first literal shifts everything below it; applying
        // bottom-up keeps the second line number valid.
        script.add_update(1, "r\"\"\"\nFIRST+\nGROWN\n\"\"\"".to_string());
        script.add_update(2, "r\"\"\"SECOND+\"\"\"".to_string());
        script.update().unwrap();

        assert_eq!(
            script.content().unwrap(),
            concat!(
                "let a = baseline!(r\"\"\"\nFIRST+\nGROWN\n\"\"\");\n",
                "let b = baseline!(r\"\"\"SECOND+\"\"\");\n",
            )
        );
    }

    #[test]
    fn missing_literal_reports_locate_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "fixture.rs", "let x = 1;\n");

        let mut script = Script::new(&path);
        script.add_update(1, "r\"\"\"NEW\"\"\"".to_string());
        let err = script.update().unwrap_err();
        assert!(matches!(err, PatchError::LiteralNotFound { line: 1, .. }));
    }

    #[test]
    fn copy_mode_writes_proposal_beside_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "fixture.rs",
            "let x = baseline!(r\"\"\"SINGLE\"\"\");\n",
        );

        let mut script = Script::new(&path);
        script.add_update(1, "r\"\"\"SINGLE+\"\"\"".to_string());
        script.update().unwrap();
        let notice = script.write(Mode::Copy).unwrap();

        assert_eq!(notice.written, dir.path().join("fixture.update.rs"));
        assert_eq!(
            fs::read_to_string(&notice.written).unwrap(),
            "let x = baseline!(r\"\"\"SINGLE+\"\"\");\n"
        );
        // Original untouched.
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "let x = baseline!(r\"\"\"SINGLE\"\"\");\n"
        );
    }

    #[test]
    fn overwrite_mode_replaces_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "fixture.rs",
            "let x = baseline!(r\"\"\"SINGLE\"\"\");\n",
        );

        let mut script = Script::new(&path);
        script.add_update(1, "r\"\"\"SINGLE+\"\"\"".to_string());
        script.update().unwrap();
        let notice = script.write(Mode::Overwrite).unwrap();

        assert_eq!(notice.written, path);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "let x = baseline!(r\"\"\"SINGLE+\"\"\");\n"
        );
    }

    #[test]
    fn update_path_without_extension() {
        let script = Script::new("/tmp/fixture");
        assert_eq!(script.update_path(), PathBuf::from("/tmp/fixture.update"));
    }
}
