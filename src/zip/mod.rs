//! ZIP archive writing and reading.
//!
//! This module provides the container format used for generated archives,
//! written from scratch on top of `byteorder` and `flate2`.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`writer`]: In-memory archive writer and the default [`ArchiveWriter`](crate::archive::ArchiveWriter)
//! - [`reader`]: Reader used to list and verify finished archives
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - UTF-8 entry names
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No ZIP64 extensions
//! - No encryption support
//! - No multi-disk archive support

mod reader;
mod structures;
mod writer;

pub use reader::ZipReader;
pub use structures::*;
pub use writer::{ZipArchiveWriter, ZipWriter};
