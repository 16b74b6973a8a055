use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::format::Flavor;

/// Metadata for one archive entry, handed to the read callback before its
/// data stream.
#[derive(Clone, Debug)]
pub struct EntryMeta {
    /// Entry path relative to the extraction root, not yet sanitized.
    pub path: PathBuf,
    /// Expected payload size; `None` when the source cannot know it (raw
    /// streams, unset headers).
    pub size: Option<u64>,
    pub is_dir: bool,
}

/// A probed source file opened for entry-by-entry reading.
///
/// Raw flavors yield exactly one synthetic entry named after the source
/// file's own basename, since raw streams carry no reliable path metadata.
pub struct SourceArchive {
    path: PathBuf,
    flavor: Flavor,
    output_name: PathBuf,
}

impl SourceArchive {
    /// Probe `path` and prepare it for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let flavor = Flavor::probe(path)?;
        let output_name = path
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| Error::EntryPath {
                path: path.to_path_buf(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            flavor,
            output_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flavor(&self) -> &Flavor {
        &self.flavor
    }

    /// Drive `f` once per entry, terminating cleanly at end-of-archive.
    ///
    /// The error type is generic so callers can thread their own failures
    /// (write errors, resource limits) through the traversal.
    pub fn read_entries<E, F>(self, mut f: F) -> std::result::Result<(), E>
    where
        E: From<Error>,
        F: FnMut(&EntryMeta, &mut dyn Read) -> std::result::Result<(), E>,
    {
        match &self.flavor {
            #[cfg(feature = "zip")]
            Flavor::Container(crate::format::ContainerFormat::Zip) => self.read_zip_entries(&mut f),
            #[cfg(not(feature = "zip"))]
            Flavor::Container(crate::format::ContainerFormat::Zip) => {
                Err(E::from(Error::UnsupportedFormat))
            }
            #[cfg(feature = "tar")]
            Flavor::Container(crate::format::ContainerFormat::Tar { .. }) => {
                self.read_tar_entries(&mut f)
            }
            #[cfg(not(feature = "tar"))]
            Flavor::Container(crate::format::ContainerFormat::Tar { .. }) => {
                Err(E::from(Error::UnsupportedFormat))
            }
            Flavor::RawPlain | Flavor::RawCompressed { .. } => self.read_raw_entry(&mut f),
        }
    }

    #[cfg(feature = "zip")]
    fn read_zip_entries<E, F>(&self, f: &mut F) -> std::result::Result<(), E>
    where
        E: From<Error>,
        F: FnMut(&EntryMeta, &mut dyn Read) -> std::result::Result<(), E>,
    {
        let file = self.open_file().map_err(E::from)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            E::from(Error::Corrupted {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        })?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                E::from(Error::Corrupted {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            })?;

            let Some(entry_path) = entry.enclosed_name() else {
                return Err(E::from(Error::PathEscape {
                    entry: PathBuf::from(entry.name()),
                }));
            };
            let meta = EntryMeta {
                path: entry_path,
                size: Some(entry.size()),
                is_dir: entry.is_dir(),
            };

            if meta.is_dir {
                f(&meta, &mut std::io::empty())?;
            } else {
                f(&meta, &mut entry)?;
            }
        }

        Ok(())
    }

    #[cfg(feature = "tar")]
    fn read_tar_entries<E, F>(&self, f: &mut F) -> std::result::Result<(), E>
    where
        E: From<Error>,
        F: FnMut(&EntryMeta, &mut dyn Read) -> std::result::Result<(), E>,
    {
        let file = self.open_file().map_err(E::from)?;
        let reader = crate::format::decode_chain(file, self.flavor.filters()).map_err(E::from)?;
        let mut archive = tar::Archive::new(reader);

        let entries = archive.entries().map_err(|source| {
            E::from(Error::Read {
                path: self.path.clone(),
                source,
            })
        })?;
        for entry in entries {
            let mut entry = entry.map_err(|source| {
                E::from(Error::Read {
                    path: self.path.clone(),
                    source,
                })
            })?;

            let kind = entry.header().entry_type();
            if !kind.is_file() && !kind.is_dir() {
                tracing::debug!(
                    "skipping non-regular entry in {}: {:?}",
                    self.path.display(),
                    kind
                );
                continue;
            }

            let entry_path = entry
                .path()
                .map_err(|source| {
                    E::from(Error::Read {
                        path: self.path.clone(),
                        source,
                    })
                })?
                .into_owned();
            let meta = EntryMeta {
                path: entry_path,
                size: Some(entry.size()),
                is_dir: kind.is_dir(),
            };

            f(&meta, &mut entry)?;
        }

        Ok(())
    }

    fn read_raw_entry<E, F>(&self, f: &mut F) -> std::result::Result<(), E>
    where
        E: From<Error>,
        F: FnMut(&EntryMeta, &mut dyn Read) -> std::result::Result<(), E>,
    {
        let file = self.open_file().map_err(E::from)?;
        let mut reader =
            crate::format::decode_chain(file, self.flavor.filters()).map_err(E::from)?;

        let meta = EntryMeta {
            path: self.output_name.clone(),
            size: None,
            is_dir: false,
        };
        f(&meta, &mut reader)
    }

    fn open_file(&self) -> Result<std::fs::File> {
        std::fs::File::open(&self.path).map_err(|source| Error::Open {
            path: self.path.clone(),
            source,
        })
    }
}
