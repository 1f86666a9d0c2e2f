use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("{path}:{line}: no enclosing triple-quoted literal found", path = .path.display())]
    LiteralNotFound { path: PathBuf, line: u32 },

    #[error("I/O error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
