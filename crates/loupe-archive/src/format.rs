use std::fmt;
use std::io::Read;

use crate::error::{Error, Result};

/// Reader type threaded through the filter decoder chain.
pub type BoxedReader = Box<dyn Read + Send>;

/// What a source file turned out to be, decided once at probe time.
///
/// Raw flavors mean no structured container was found; the data is a single
/// byte stream, possibly behind one or more compression filters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flavor {
    Container(ContainerFormat),
    RawPlain,
    RawCompressed { filters: Vec<Filter> },
}

/// A structured container format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Zip,
    /// A tar stream, possibly behind a filter chain (e.g. `.tar.gz`).
    Tar { filters: Vec<Filter> },
}

/// A single compression filter, stackable. Chains are ordered outermost
/// first, i.e. the filter whose magic appears on disk comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Filter {
    /// Match the leading bytes of a stream against the known filter magics.
    pub fn from_magic(data: &[u8]) -> Option<Filter> {
        match data {
            [0x1F, 0x8B, ..] => Some(Filter::Gzip),
            [0x42, 0x5A, 0x68, ..] => Some(Filter::Bzip2),
            [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => Some(Filter::Xz),
            [0x28, 0xB5, 0x2F, 0xFD, ..] => Some(Filter::Zstd),
            _ => None,
        }
    }

    /// Wrap `reader` in a decoder for this filter.
    pub fn decoder(self, reader: BoxedReader) -> Result<BoxedReader> {
        match self {
            #[cfg(feature = "gzip")]
            Filter::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
            #[cfg(not(feature = "gzip"))]
            Filter::Gzip => Err(Error::UnsupportedFormat),
            #[cfg(feature = "bzip2")]
            Filter::Bzip2 => Ok(Box::new(bzip2::read::BzDecoder::new(reader))),
            #[cfg(not(feature = "bzip2"))]
            Filter::Bzip2 => Err(Error::UnsupportedFormat),
            #[cfg(feature = "xz")]
            Filter::Xz => Ok(Box::new(xz2::read::XzDecoder::new(reader))),
            #[cfg(not(feature = "xz"))]
            Filter::Xz => Err(Error::UnsupportedFormat),
            #[cfg(feature = "zstd")]
            Filter::Zstd => Ok(Box::new(zstd::stream::Decoder::new(reader)?)),
            #[cfg(not(feature = "zstd"))]
            Filter::Zstd => Err(Error::UnsupportedFormat),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Filter::Gzip => "gzip",
            Filter::Bzip2 => "bzip2",
            Filter::Xz => "xz",
            Filter::Zstd => "zstd",
        };
        f.write_str(name)
    }
}

/// Build a decoder chain for `filters` over `reader`, outermost filter first.
pub fn decode_chain<R>(reader: R, filters: &[Filter]) -> Result<BoxedReader>
where
    R: Read + Send + 'static,
{
    let mut decoded: BoxedReader = Box::new(reader);
    for filter in filters {
        decoded = filter.decoder(decoded)?;
    }
    Ok(decoded)
}

impl Flavor {
    /// Whether this source deserves cache-directory extraction.
    ///
    /// Bare gzip files are common log-rotation artifacts; the viewer streams
    /// those through ordinary decompression instead of extracting them, so a
    /// raw stream behind exactly one gzip filter is not treated as an
    /// archive. Every other raw+filter combination is.
    pub fn worth_extracting(&self) -> bool {
        match self {
            Flavor::Container(_) => true,
            Flavor::RawPlain => false,
            Flavor::RawCompressed { filters } => !matches!(filters.as_slice(), [Filter::Gzip]),
        }
    }

    /// The filter chain wrapping the source, empty for unfiltered sources.
    pub fn filters(&self) -> &[Filter] {
        match self {
            Flavor::Container(ContainerFormat::Tar { filters }) => filters,
            Flavor::RawCompressed { filters } => filters,
            _ => &[],
        }
    }

    /// Raw flavors carry no trustworthy path metadata, so extraction names
    /// their single output after the source file itself.
    pub fn is_raw(&self) -> bool {
        matches!(self, Flavor::RawPlain | Flavor::RawCompressed { .. })
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(filters: &[Filter]) -> String {
            filters
                .iter()
                .map(Filter::to_string)
                .collect::<Vec<_>>()
                .join("+")
        }
        match self {
            Flavor::Container(ContainerFormat::Zip) => f.write_str("zip"),
            Flavor::Container(ContainerFormat::Tar { filters }) if filters.is_empty() => {
                f.write_str("tar")
            }
            Flavor::Container(ContainerFormat::Tar { filters }) => {
                write!(f, "tar({})", join(filters))
            }
            Flavor::RawPlain => f.write_str("raw"),
            Flavor::RawCompressed { filters } => write!(f, "raw({})", join(filters)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_magic_gzip() {
        assert_eq!(Filter::from_magic(&[0x1F, 0x8B, 0x08, 0x00]), Some(Filter::Gzip));
    }

    #[test]
    fn filter_magic_bzip2() {
        assert_eq!(Filter::from_magic(b"BZh91AY"), Some(Filter::Bzip2));
    }

    #[test]
    fn filter_magic_xz() {
        assert_eq!(
            Filter::from_magic(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, 0x00]),
            Some(Filter::Xz)
        );
    }

    #[test]
    fn filter_magic_zstd() {
        assert_eq!(
            Filter::from_magic(&[0x28, 0xB5, 0x2F, 0xFD, 0x00]),
            Some(Filter::Zstd)
        );
    }

    #[test]
    fn filter_magic_unknown() {
        assert_eq!(Filter::from_magic(b"plain text"), None);
        assert_eq!(Filter::from_magic(&[]), None);
    }

    #[test]
    fn container_flavors_worth_extracting() {
        assert!(Flavor::Container(ContainerFormat::Zip).worth_extracting());
        assert!(
            Flavor::Container(ContainerFormat::Tar { filters: vec![] }).worth_extracting()
        );
        assert!(
            Flavor::Container(ContainerFormat::Tar {
                filters: vec![Filter::Gzip]
            })
            .worth_extracting()
        );
    }

    #[test]
    fn bare_gzip_not_worth_extracting() {
        let flavor = Flavor::RawCompressed {
            filters: vec![Filter::Gzip],
        };
        assert!(!flavor.worth_extracting());
    }

    #[test]
    fn other_raw_filter_combinations_worth_extracting() {
        assert!(
            Flavor::RawCompressed {
                filters: vec![Filter::Bzip2]
            }
            .worth_extracting()
        );
        assert!(
            Flavor::RawCompressed {
                filters: vec![Filter::Bzip2, Filter::Gzip]
            }
            .worth_extracting()
        );
        assert!(
            Flavor::RawCompressed {
                filters: vec![Filter::Gzip, Filter::Gzip]
            }
            .worth_extracting()
        );
    }

    #[test]
    fn raw_plain_not_worth_extracting() {
        assert!(!Flavor::RawPlain.worth_extracting());
    }

    #[test]
    fn flavor_display() {
        assert_eq!(Flavor::Container(ContainerFormat::Zip).to_string(), "zip");
        assert_eq!(
            Flavor::Container(ContainerFormat::Tar {
                filters: vec![Filter::Gzip]
            })
            .to_string(),
            "tar(gzip)"
        );
        assert_eq!(
            Flavor::RawCompressed {
                filters: vec![Filter::Bzip2, Filter::Gzip]
            }
            .to_string(),
            "raw(bzip2+gzip)"
        );
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn decode_chain_roundtrip_gzip() {
        use std::io::Write;

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"hello logs").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut decoded = decode_chain(std::io::Cursor::new(compressed), &[Filter::Gzip]).unwrap();
        let mut out = Vec::new();
        decoded.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello logs");
    }

    #[test]
    fn decode_chain_empty_is_passthrough() {
        let mut decoded = decode_chain(std::io::Cursor::new(b"abc".to_vec()), &[]).unwrap();
        let mut out = Vec::new();
        decoded.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }
}
