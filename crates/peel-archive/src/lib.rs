//! Format sniffing and in-place unpacking of downloaded files.
//!
//! # Architecture
//!
//! - `detect.rs` - classification from the first ten bytes
//! - `unzip.rs` - replace a zip archive with one named member
//! - `gunzip.rs` - replace a gzip file with its decompressed stream
//! - `unpack.rs` - peel nested layers until the file is no longer an archive
//!
//! Every unpack step writes into a [`peel_fs::ScratchFile`] next to the target
//! and only renames it over the original once the whole member or stream has
//! been copied, so readers see either the old bytes or the new ones.

pub use detect::{FileKind, SNIFF_LEN, classify, sniff, sniff_reader};
pub use error::{Error, Result};
pub use options::{DEFAULT_BUFFER_SIZE, UnpackOptions};
pub use unpack::{UnpackOutcome, unpack_archive, unpack_archive_with, unpack_once};

#[cfg(feature = "gzip")]
pub use gunzip::{decompress_gzip, unpack_gzip, unpack_gzip_with};
#[cfg(feature = "zip")]
pub use unzip::{extract_zip_member, unpack_zip, unpack_zip_with};

pub mod detect;
pub mod unpack;
#[cfg(feature = "gzip")]
pub mod gunzip;
#[cfg(feature = "zip")]
pub mod unzip;
#[cfg(any(feature = "zip", feature = "gzip"))]
mod copy;
mod error;
mod options;
