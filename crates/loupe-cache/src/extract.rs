use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::SystemTime;

use loupe_archive::{SourceArchive, sanitize_entry_path};
use tracing::{debug, info};

use crate::cache::{ArchiveCache, ProgressHandle, sidecar};
use crate::error::{Error, Result};
use crate::lock::EntryLock;

/// Extraction aborts once available space at the destination drops below
/// this floor.
const MIN_FREE_SPACE: u64 = 32 * 1024 * 1024;

/// Bytes written between free-space checks.
const SPACE_CHECK_INTERVAL: u64 = 1024 * 1024;

const COPY_CHUNK: usize = 64 * 1024;

impl ArchiveCache {
    /// Extract `source` into its cache entry, holding the entry lock for the
    /// whole call.
    ///
    /// If the `.done` marker already exists the extraction is skipped and
    /// the marker's mtime is refreshed so the reaper sees recent use. On any
    /// failure the marker is never created and partial output is left in
    /// place; cleanup is the walker's responsibility.
    ///
    /// `progress` is invoked once per entry, directories included, before
    /// any data is written, with the destination path and the expected size
    /// (`None` when unknown); the returned counter accumulates written
    /// bytes.
    pub fn extract<P>(&self, source: &Path, progress: P) -> Result<()>
    where
        P: Fn(&Path, Option<u64>) -> ProgressHandle,
    {
        std::fs::create_dir_all(self.root())?;

        let entry_root = self.entry_path(source);
        let _lock = EntryLock::acquire(&entry_root)?;

        let done = sidecar(&entry_root, ".done");
        if done.exists() {
            touch(&done)?;
            debug!("already extracted: {}", done.display());
            return Ok(());
        }

        let archive = SourceArchive::open(source)?;
        info!(
            "extracting {} ({}) to {}",
            source.display(),
            archive.flavor(),
            entry_root.display()
        );

        let source_path = source.to_path_buf();
        archive.read_entries::<Error, _>(|meta, reader| {
            let dest = sanitize_entry_path(&meta.path, &entry_root)?;
            let counter = progress(&dest, meta.size);

            if meta.is_dir {
                return create_entry_dir(&dest);
            }
            if let Some(parent) = dest.parent() {
                if !parent.exists() {
                    create_entry_dir(parent)?;
                }
            }

            let mut out = File::create(&dest).map_err(|source| Error::EntryWrite {
                path: dest.clone(),
                source,
            })?;
            copy_entry_data(
                &source_path,
                &meta.path,
                reader,
                &mut out,
                &dest,
                &entry_root,
                &counter,
            )?;
            drop(out);

            set_mode(&dest, 0o400)
        })?;

        debug!("extraction complete: {}", source.display());
        create_marker(&done)
    }
}

fn copy_entry_data(
    source: &Path,
    entry: &Path,
    reader: &mut dyn Read,
    out: &mut File,
    dest: &Path,
    entry_root: &Path,
    counter: &ProgressHandle,
) -> Result<()> {
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut since_check = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::EntryRead {
                    path: source.to_path_buf(),
                    entry: entry.to_path_buf(),
                    source: e,
                });
            }
        };

        out.write_all(&buf[..n]).map_err(|source| Error::EntryWrite {
            path: dest.to_path_buf(),
            source,
        })?;
        counter.fetch_add(n as u64, Ordering::Relaxed);

        since_check += n as u64;
        if since_check >= SPACE_CHECK_INTERVAL {
            since_check = 0;
            ensure_free_space(entry_root)?;
        }
    }
}

fn ensure_free_space(entry_root: &Path) -> Result<()> {
    // A failed query never aborts the copy; only a confirmed low reading does.
    match fs2::available_space(entry_root) {
        Ok(available) if available < MIN_FREE_SPACE => Err(Error::LowDiskSpace {
            path: entry_root.to_path_buf(),
            available,
        }),
        _ => Ok(()),
    }
}

/// Extracted content gets restrictive modes regardless of what the archive
/// recorded: owner-read for files, owner-rwx for directories.
fn create_entry_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::EntryWrite {
        path: path.to_path_buf(),
        source,
    })?;
    set_mode(path, 0o700)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|source| {
        Error::EntryWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn touch(path: &Path) -> Result<()> {
    let marker = File::options()
        .write(true)
        .open(path)
        .map_err(|source| marker_error(path, source))?;
    marker
        .set_modified(SystemTime::now())
        .map_err(|source| marker_error(path, source))
}

fn create_marker(path: &Path) -> Result<()> {
    let mut options = File::options();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(path)
        .map(|_| ())
        .map_err(|source| marker_error(path, source))
}

fn marker_error(path: &Path, source: io::Error) -> Error {
    Error::Marker {
        path: path.to_path_buf(),
        source,
    }
}
