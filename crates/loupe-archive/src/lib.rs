//! Archive flavor probing and read-side extraction for the loupe log viewer.
//!
//! # Architecture
//!
//! - `format.rs` - Flavor model (container vs. raw stream) and filter codecs
//! - `probe.rs` - Magic-number probing with filter-chain peeling
//! - `detect.rs` - "Is this worth extracting?" classification policy
//! - `source.rs` - Unified entry reader over zip/tar/raw sources
//! - `sanitize.rs` - Entry path sanitization (zip-slip prevention)

pub use detect::is_archive;
pub use error::{Error, Result};
pub use format::{BoxedReader, ContainerFormat, Filter, Flavor, decode_chain};
pub use sanitize::sanitize_entry_path;
pub use source::{EntryMeta, SourceArchive};

mod detect;
mod error;
mod format;
mod probe;
mod sanitize;
mod source;
