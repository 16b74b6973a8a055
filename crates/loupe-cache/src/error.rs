use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive support not compiled in")]
    NotSupported,

    #[cfg(feature = "extract")]
    #[error(transparent)]
    Archive(#[from] loupe_archive::Error),

    #[error("unable to lock cache entry {path}: {source}")]
    Lock { path: PathBuf, source: io::Error },

    #[error("failed to read entry {entry} from {path}: {source}")]
    EntryRead {
        path: PathBuf,
        entry: PathBuf,
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    EntryWrite { path: PathBuf, source: io::Error },

    #[error("available space too low under {path}: {available} bytes left")]
    LowDiskSpace { path: PathBuf, available: u64 },

    #[error("failed to update cache marker {path}: {source}")]
    Marker { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
