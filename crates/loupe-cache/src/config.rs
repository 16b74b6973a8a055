use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Cache tuning, consumed by the reaper.
///
/// Passed explicitly into [`crate::ArchiveCache`] rather than looked up from
/// process-wide state.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long an unused cache entry stays on disk after its last access.
    pub cache_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(cache_ttl: Duration) -> Self {
        Self { cache_ttl }
    }
}
