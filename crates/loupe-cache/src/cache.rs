use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use crate::config::CacheConfig;
use crate::hash::content_key;

/// Per-entry byte counter handed back by progress callbacks; the extraction
/// loop accumulates written bytes into it while the caller reads it from
/// another thread.
pub type ProgressHandle = Arc<AtomicU64>;

/// Handle on the shared extraction cache directory.
///
/// The default root lives under the system temp dir and is namespaced per
/// user, so independent loupe processes of one user share entries while
/// users stay isolated. All mutation of an entry is gated by its `.lck`
/// sidecar; see `extract.rs`.
#[derive(Clone, Debug)]
pub struct ArchiveCache {
    root: PathBuf,
    config: CacheConfig,
}

impl ArchiveCache {
    /// Cache rooted at `<system-temp-dir>/loupe-<uid>-archives`.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            root: default_cache_root(),
            config,
        }
    }

    /// Cache rooted at an explicit directory, for tests and embedders.
    pub fn with_root(root: impl Into<PathBuf>, config: CacheConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Deterministic cache entry directory for `source`:
    /// `<root>/arc-<content-key>-<basename>`. Recomputed from the file's
    /// current bytes on every call.
    pub fn entry_path(&self, source: &Path) -> PathBuf {
        let basename = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.root
            .join(format!("arc-{}-{}", content_key(source), basename))
    }
}

/// Sidecar path sharing the entry directory's name: `<entry>.lck`,
/// `<entry>.done`.
pub(crate) fn sidecar(entry_root: &Path, suffix: &str) -> PathBuf {
    let mut name = entry_root.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn default_cache_root() -> PathBuf {
    std::env::temp_dir().join(format!("loupe-{}-archives", effective_uid()))
}

#[cfg(unix)]
fn effective_uid() -> String {
    nix::unistd::getuid().to_string()
}

#[cfg(not(unix))]
fn effective_uid() -> String {
    "0".to_string()
}
