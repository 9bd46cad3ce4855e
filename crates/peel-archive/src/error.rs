use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[cfg(feature = "zip")]
    #[error("archive is corrupted: {0}")]
    Corrupted(#[from] zip::result::ZipError),

    #[error("failed to decompress '{path}': {source}")]
    Decode { path: PathBuf, source: io::Error },

    #[error("member '{name}' is listed in the archive but missing from its stream")]
    MemberVanished { name: String },

    #[error("failed to commit unpacked contents: {0}")]
    Commit(#[from] peel_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
