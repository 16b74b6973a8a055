use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry path under `base`, rejecting anything that would
/// land outside it.
///
/// Absolute entries and `..` sequences climbing past the base are refused;
/// `.` components are dropped. Returns the absolute destination path.
pub fn sanitize_entry_path(entry: &Path, base: &Path) -> Result<PathBuf> {
    let mut resolved = base.to_path_buf();
    let mut depth = 0usize;

    for component in entry.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return Err(Error::PathEscape {
                        entry: entry.to_path_buf(),
                    });
                }
                resolved.pop();
                depth -= 1;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathEscape {
                    entry: entry.to_path_buf(),
                });
            }
        }
    }

    Ok(resolved)
}
