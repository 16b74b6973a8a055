//! Shared on-disk extraction cache for archive-backed log files.
//!
//! Multiple loupe processes race over one cache directory under the system
//! temp dir, namespaced per user. Each source archive maps to a cache entry
//! directory plus two sidecar files: `<entry>.lck`, the advisory lock
//! serializing extraction across processes, and `<entry>.done`, created only
//! after a fully successful extraction. The `.done` marker's mtime doubles
//! as the entry's last-access stamp for TTL-based reaping.
//!
//! # Architecture
//!
//! - `hash.rs` - Content key over a filename and its leading bytes
//! - `cache.rs` - `ArchiveCache` root/entry path resolution
//! - `lock.rs` - Cross-process entry lock with drop-release guard
//! - `extract.rs` - Lock-guarded, idempotent extraction into an entry
//! - `walk.rs` - Extract-then-visit traversal with partial-output cleanup
//! - `reaper.rs` - Detached best-effort TTL eviction
//! - `config.rs` - Cache tuning (`CacheConfig`)

pub use cache::{ArchiveCache, ProgressHandle};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use hash::content_key;
pub use lock::EntryLock;

#[cfg(feature = "extract")]
pub use loupe_archive::is_archive;

mod cache;
mod config;
mod error;
#[cfg(feature = "extract")]
mod extract;
mod hash;
mod lock;
mod reaper;
mod walk;
