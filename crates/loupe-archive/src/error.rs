use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive format")]
    UnsupportedFormat,

    #[error("unable to open archive {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("unable to read archive {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("corrupted archive {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("entry path escapes extraction root: '{entry}'")]
    PathEscape { entry: PathBuf },

    #[error("archive entry has no usable path in {path}")]
    EntryPath { path: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
