use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::cache::ArchiveCache;

impl ArchiveCache {
    /// Evict cache entries unused for longer than the configured TTL.
    ///
    /// Fire-and-forget: the scan runs on a detached thread and is never
    /// joined; outcomes are observable only through log events. Failures
    /// on one entry never abort the batch.
    ///
    /// Expiry is judged from the `.done` marker's mtime alone, without
    /// re-acquiring the entry lock. An entry mid-extraction has no marker
    /// yet and cannot be reaped; a just-completed entry can be reaped
    /// immediately under a zero TTL, which is accepted.
    pub fn cleanup(&self) {
        let root = self.root().to_path_buf();
        let ttl = self.config().cache_ttl;

        let spawned = std::thread::Builder::new()
            .name("cache-reaper".into())
            .spawn(move || reap(&root, ttl));
        if let Err(e) = spawned {
            warn!("failed to spawn cache reaper: {e}");
        }
    }
}

fn reap(root: &Path, ttl: Duration) {
    let now = SystemTime::now();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cache root {} not scanned: {e}", root.display());
            return;
        }
    };

    debug!("reaping cache entries older than {ttl:?} under {}", root.display());

    let mut expired: Vec<PathBuf> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension() != Some("done".as_ref()) {
            continue;
        }

        let mtime = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!("unable to stat cache marker {}: {e}", path.display());
                continue;
            }
        };

        match now.duration_since(mtime) {
            Ok(age) if age >= ttl => expired.push(path),
            _ => {}
        }
    }

    for done in expired {
        debug!("removing cached archive: {}", done.display());
        if let Err(e) = std::fs::remove_file(&done) {
            warn!("failed to remove {}: {e}", done.display());
        }

        let lck = done.with_extension("lck");
        if let Err(e) = std::fs::remove_file(&lck) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove {}: {e}", lck.display());
            }
        }

        let entry_dir = done.with_extension("");
        if let Err(e) = std::fs::remove_dir_all(&entry_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove {}: {e}", entry_dir.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn make_entry(root: &Path, name: &str, age: Duration) {
        let entry_dir = root.join(name);
        std::fs::create_dir_all(&entry_dir).unwrap();
        std::fs::write(entry_dir.join("inner.log"), b"cached").unwrap();
        File::create(root.join(format!("{name}.lck"))).unwrap();

        let done = root.join(format!("{name}.done"));
        let marker = File::create(&done).unwrap();
        marker
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    #[test]
    fn expired_entries_are_fully_removed() {
        let dir = tempfile::tempdir().unwrap();
        make_entry(dir.path(), "arc-old-a.tar", Duration::from_secs(120));

        reap(dir.path(), Duration::from_secs(60));

        assert!(!dir.path().join("arc-old-a.tar.done").exists());
        assert!(!dir.path().join("arc-old-a.tar.lck").exists());
        assert!(!dir.path().join("arc-old-a.tar").exists());
    }

    #[test]
    fn fresh_entries_are_untouched() {
        let dir = tempfile::tempdir().unwrap();
        make_entry(dir.path(), "arc-new-b.tar", Duration::from_secs(1));

        reap(dir.path(), Duration::from_secs(3600));

        assert!(dir.path().join("arc-new-b.tar.done").exists());
        assert!(dir.path().join("arc-new-b.tar.lck").exists());
        assert!(dir.path().join("arc-new-b.tar/inner.log").exists());
    }

    #[test]
    fn zero_ttl_expires_everything() {
        let dir = tempfile::tempdir().unwrap();
        make_entry(dir.path(), "arc-any-c.tar", Duration::from_secs(1));

        reap(dir.path(), Duration::ZERO);

        assert!(!dir.path().join("arc-any-c.tar.done").exists());
        assert!(!dir.path().join("arc-any-c.tar").exists());
    }

    #[test]
    fn one_failure_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        // Marker with no sibling directory or lock file at all.
        let done = dir.path().join("arc-ghost-d.tar.done");
        let marker = File::create(&done).unwrap();
        marker
            .set_modified(SystemTime::now() - Duration::from_secs(120))
            .unwrap();
        make_entry(dir.path(), "arc-old-e.tar", Duration::from_secs(120));

        reap(dir.path(), Duration::from_secs(60));

        assert!(!done.exists());
        assert!(!dir.path().join("arc-old-e.tar").exists());
    }

    #[test]
    fn missing_cache_root_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        reap(&dir.path().join("never-created"), Duration::ZERO);
    }

    #[test]
    fn non_marker_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"keep me").unwrap();

        reap(dir.path(), Duration::ZERO);

        assert!(dir.path().join("stray.txt").exists());
    }
}
