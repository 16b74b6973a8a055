use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::{BoxedReader, ContainerFormat, Filter, Flavor};

/// How many leading bytes each probing step looks at. Large enough to cover
/// a full tar header block after decompression.
const PEEK_LEN: usize = 1024;

/// Bound on filter-chain peeling; deeper nesting is treated as an opaque
/// compressed stream.
const MAX_FILTER_DEPTH: usize = 4;

impl Flavor {
    /// Probe the leading bytes of `path` and decide its flavor.
    ///
    /// Filter magics are peeled one at a time by wrapping the stream in the
    /// matching decoder and peeking again at the decoded bytes, so a
    /// `.tar.gz` resolves to a tar container behind a gzip filter rather
    /// than a bare compressed stream.
    pub fn probe(path: &Path) -> Result<Flavor> {
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader: BoxedReader = Box::new(file);
        let mut filters: Vec<Filter> = Vec::new();

        loop {
            let head = peek(&mut reader).map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?;

            if filters.is_empty() && is_zip_header(&head) {
                return Ok(Flavor::Container(ContainerFormat::Zip));
            }
            if is_tar_header(&head) {
                return Ok(Flavor::Container(ContainerFormat::Tar { filters }));
            }
            if let Some(filter) = Filter::from_magic(&head) {
                if filters.len() < MAX_FILTER_DEPTH {
                    // Reattach the peeked bytes before handing the stream to
                    // the decoder.
                    let rewound = Box::new(Cursor::new(head).chain(reader));
                    reader = filter.decoder(rewound)?;
                    filters.push(filter);
                    continue;
                }
            }

            return Ok(if filters.is_empty() {
                Flavor::RawPlain
            } else {
                Flavor::RawCompressed { filters }
            });
        }
    }
}

fn is_zip_header(data: &[u8]) -> bool {
    matches!(data, [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..])
}

fn is_tar_header(data: &[u8]) -> bool {
    // Covers both POSIX ("ustar\0") and GNU ("ustar ") magic.
    data.len() >= 262 && &data[257..262] == b"ustar"
}

/// Read up to `PEEK_LEN` bytes, tolerating early end-of-stream.
fn peek(reader: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; PEEK_LEN];
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}
