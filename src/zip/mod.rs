//! ZIP archives as resource containers.
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! [`ZipArchive`] reads the EOCD and the Central Directory from the end of
//! the archive resource, then hands out one [`ZipEntryResource`] per entry.
//! Only the data of the entries actually read is fetched, which suits
//! archives served over HTTP Range requests.
//!
//! ## Supported Features
//!
//! - ZIP64 extensions for archives > 4GB
//! - STORED (no compression) method, read with direct range requests
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support

mod archive;
mod parser;
mod structures;

pub use archive::{ARCHIVE_KEY, ZipArchive, ZipEntryResource};
pub use parser::ZipParser;
pub use structures::{CompressionMethod, ZipEntry};
