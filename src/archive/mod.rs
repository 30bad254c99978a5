//! Archive assembly.
//!
//! Turns parsed file records and residual prose into a single archive
//! through an injected [`ArchiveWriter`]. The crate's own ZIP writer
//! ([`ZipArchiveWriter`](crate::zip::ZipArchiveWriter)) is the default.

mod builder;
mod path;

pub use builder::{
    ArchiveBuilder, BuildOptions, BuildSummary, BuiltArchive, DEFAULT_ARCHIVE_NAME,
    derive_base_name,
};
pub use path::{PathPolicy, unsafe_reason};

use anyhow::Result;
use async_trait::async_trait;

/// A named buffer handed to the archive writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// Serializes a set of entries into one archive blob
///
/// Entries arrive in registration order. When two entries share a path,
/// the later one's data must win.
#[async_trait]
pub trait ArchiveWriter: Send + Sync {
    async fn write_archive(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>>;
}
