use std::path::Path;

use crate::cache::{ArchiveCache, ProgressHandle};
use crate::error::Result;

impl ArchiveCache {
    /// Ensure `source` is extracted, then invoke `visit` with
    /// `(entry_root, file_path)` for every regular file in the cache entry.
    ///
    /// Extraction failures remove the possibly partial entry directory
    /// before the error propagates, so a retry starts clean. Traversal
    /// order is whatever the filesystem yields; directories and
    /// non-regular files are skipped.
    #[cfg(feature = "extract")]
    pub fn walk_archive_files<P, V>(&self, source: &Path, progress: P, mut visit: V) -> Result<()>
    where
        P: Fn(&Path, Option<u64>) -> ProgressHandle,
        V: FnMut(&Path, &Path),
    {
        let entry_root = self.entry_path(source);

        if let Err(e) = self.extract(source, progress) {
            if let Err(rm) = std::fs::remove_dir_all(&entry_root) {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        "failed to remove partial cache entry {}: {rm}",
                        entry_root.display()
                    );
                }
            }
            return Err(e);
        }

        for entry in walkdir::WalkDir::new(&entry_root) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => visit(&entry_root, entry.path()),
                Ok(_) => {}
                Err(e) => tracing::debug!("skipping unreadable cache path: {e}"),
            }
        }

        Ok(())
    }

    /// Built without archive support: every walk fails uniformly.
    #[cfg(not(feature = "extract"))]
    pub fn walk_archive_files<P, V>(&self, _source: &Path, _progress: P, _visit: V) -> Result<()>
    where
        P: Fn(&Path, Option<u64>) -> ProgressHandle,
        V: FnMut(&Path, &Path),
    {
        Err(crate::error::Error::NotSupported)
    }
}
