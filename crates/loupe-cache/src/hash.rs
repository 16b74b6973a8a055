use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// How much of a file's leading content participates in its cache key.
pub const CONTENT_PREFIX_LEN: usize = 1024;

/// Derive a stable cache key from a file's basename and the first
/// [`CONTENT_PREFIX_LEN`] bytes of its content.
///
/// If the file cannot be opened the key degrades to hashing the basename
/// alone; resolution stays deterministic and never fails. The key is
/// recomputed from the file's current bytes on every call, so a file whose
/// leading bytes change maps to a different cache entry.
pub fn content_key(path: &Path) -> String {
    let mut hasher = Sha256::new();

    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    hasher.update(basename.as_bytes());

    if let Ok(mut file) = File::open(path) {
        let mut prefix = [0u8; CONTENT_PREFIX_LEN];
        let mut filled = 0;
        while filled < prefix.len() {
            match file.read(&mut prefix[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        hasher.update(&prefix[..filled]);
    }

    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
