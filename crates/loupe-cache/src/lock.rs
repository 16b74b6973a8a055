use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::cache::sidecar;
use crate::error::{Error, Result};

/// Advisory cross-process lock over one cache entry's `.lck` sidecar.
///
/// Acquisition blocks until the whole-file lock is owned; release happens on
/// drop, so every exit path from a critical section unlocks. The lock file
/// itself persists for the entry's lifetime (the reaper removes it together
/// with the entry). This lock is the only correctness boundary preventing
/// two processes from extracting into the same entry at once.
#[derive(Debug)]
pub struct EntryLock {
    file: File,
    path: PathBuf,
}

impl EntryLock {
    /// Create the `.lck` sidecar for `entry_root` if needed and block until
    /// this process holds the exclusive lock.
    pub fn acquire(entry_root: &Path) -> Result<Self> {
        let path = sidecar(entry_root, ".lck");

        let mut options = OpenOptions::new();
        options.create(true).read(true).write(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(&path).map_err(|source| Error::Lock {
            path: path.clone(),
            source,
        })?;

        #[cfg(unix)]
        set_cloexec(&file);

        fs2::FileExt::lock_exclusive(&file).map_err(|source| Error::Lock {
            path: path.clone(),
            source,
        })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Lock fds must not leak into spawned viewers/pagers.
#[cfg(unix)]
fn set_cloexec(file: &File) {
    use nix::fcntl::{FcntlArg, FdFlag, fcntl};

    if let Err(e) = fcntl(file, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)) {
        tracing::warn!("failed to set close-on-exec on lock file: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_is_created_next_to_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("arc-abc-x.tar");

        let lock = EntryLock::acquire(&entry).unwrap();
        assert_eq!(lock.path(), dir.path().join("arc-abc-x.tar.lck"));
        assert!(lock.path().exists());
    }

    #[test]
    fn lock_excludes_other_descriptors_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("arc-abc-x.tar");

        let lock = EntryLock::acquire(&entry).unwrap();

        let probe = OpenOptions::new()
            .read(true)
            .write(true)
            .open(lock.path())
            .unwrap();
        assert!(fs2::FileExt::try_lock_exclusive(&probe).is_err());

        drop(lock);
        assert!(fs2::FileExt::try_lock_exclusive(&probe).is_ok());
        let _ = fs2::FileExt::unlock(&probe);
    }

    #[test]
    fn lock_file_persists_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("arc-abc-x.tar");

        let lck_path = {
            let lock = EntryLock::acquire(&entry).unwrap();
            lock.path().to_path_buf()
        };
        assert!(lck_path.exists());
    }
}
