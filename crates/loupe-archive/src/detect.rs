use std::path::Path;

use tracing::info;

use crate::format::Flavor;

/// Decide whether `path` is a true archive worth extracting into the cache.
///
/// Probing failures are classification outcomes, not errors: an unreadable
/// or unrecognizable file is simply not an archive. The asymmetric raw
/// handling lives in [`Flavor::worth_extracting`].
pub fn is_archive(path: &Path) -> bool {
    match Flavor::probe(path) {
        Ok(flavor) => {
            let worth = flavor.worth_extracting();
            if worth {
                info!("detected archive: {} -- {}", path.display(), flavor);
            }
            worth
        }
        Err(e) => {
            info!("archive probe failed: {} -- {}", path.display(), e);
            false
        }
    }
}
