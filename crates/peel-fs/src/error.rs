use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to replace '{path}': {source}")]
    Persist { path: PathBuf, source: io::Error },

    #[error("failed to list directory '{path}': {source}")]
    Dir { path: PathBuf, source: io::Error },

    #[error("path has no parent directory: '{0}'")]
    NoParent(PathBuf),

    #[error("invalid name pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, Error>;
