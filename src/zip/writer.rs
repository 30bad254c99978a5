//! In-memory ZIP archive writer.
//!
//! Entries are kept in registration order until [`ZipWriter::finish`]
//! lays the archive out front to back:
//! 1. Local File Header and data for each entry
//! 2. Central Directory with one header per entry
//! 3. End of Central Directory record
//!
//! ZIP64 is never written, so archives are limited to 65534 entries and
//! 4 GiB of data.

use async_trait::async_trait;
use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

use crate::archive::{ArchiveEntry, ArchiveWriter};
use anyhow::{Result, bail};

use super::structures::*;

struct PendingEntry {
    name: String,
    data: Vec<u8>,
}

/// ZIP archive builder that keeps everything in memory
pub struct ZipWriter {
    compression: CompressionMethod,
    modified: DosDateTime,
    entries: Vec<PendingEntry>,
    /// Name to position in `entries`
    index: HashMap<String, usize>,
}

impl ZipWriter {
    pub fn new(compression: CompressionMethod, modified: DosDateTime) -> Self {
        Self {
            compression,
            modified,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a file.
    ///
    /// A name that is already registered keeps its position in the archive
    /// but takes the new data. Returns `true` in that case.
    pub fn add_file(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> bool {
        let name = name.into();
        let data = data.into();

        if let Some(&position) = self.index.get(&name) {
            self.entries[position].data = data;
            return true;
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(PendingEntry { name, data });
        false
    }

    /// Number of distinct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize all entries into a complete archive.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.entries.len() >= 0xFFFF {
            bail!(
                "Too many entries for a ZIP archive: {} (max: {})",
                self.entries.len(),
                0xFFFF - 1
            );
        }

        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let lfh_offset = fit_u32(out.len(), "archive offset")?;
            let (method, payload) = compress(self.compression, &entry.data)?;

            let mut crc = Crc::new();
            crc.update(&entry.data);

            let header = EntryHeader {
                file_name: entry.name.clone(),
                compression_method: method,
                modified: self.modified,
                crc32: crc.sum(),
                compressed_size: fit_u32(payload.len(), &entry.name)?,
                uncompressed_size: fit_u32(entry.data.len(), &entry.name)?,
            };

            header.write_local(&mut out)?;
            out.write_all(&payload)?;
            header.write_central(&mut central, lfh_offset)?;

            debug!(
                name = %entry.name,
                method = ?method,
                size = entry.data.len(),
                compressed = payload.len(),
                "zip entry written"
            );
        }

        let cd_offset = fit_u32(out.len(), "central directory offset")?;
        let cd_size = fit_u32(central.len(), "central directory size")?;
        out.extend_from_slice(&central);

        EndOfCentralDirectory::new(self.entries.len() as u16, cd_size, cd_offset)
            .write_to(&mut out)?;

        Ok(out)
    }
}

/// Sizes and offsets must stay below the ZIP64 marker value
fn fit_u32(value: usize, what: &str) -> Result<u32> {
    match u32::try_from(value) {
        Ok(v) if v != u32::MAX => Ok(v),
        _ => bail!("Size exceeds the ZIP limit for {}: {} bytes", what, value),
    }
}

/// Compress `data`, falling back to STORED when deflate does not help.
fn compress(method: CompressionMethod, data: &[u8]) -> Result<(CompressionMethod, Cow<'_, [u8]>)> {
    match method {
        CompressionMethod::Stored => Ok((CompressionMethod::Stored, Cow::Borrowed(data))),
        CompressionMethod::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            let packed = encoder.finish()?;

            if packed.len() < data.len() {
                Ok((CompressionMethod::Deflate, Cow::Owned(packed)))
            } else {
                Ok((CompressionMethod::Stored, Cow::Borrowed(data)))
            }
        }
        CompressionMethod::Unknown(v) => bail!("Unsupported compression method: {}", v),
    }
}

/// [`ArchiveWriter`] producing standard ZIP containers
pub struct ZipArchiveWriter {
    compression: CompressionMethod,
    modified: DosDateTime,
}

impl ZipArchiveWriter {
    pub fn new(compression: CompressionMethod, modified: DosDateTime) -> Self {
        Self {
            compression,
            modified,
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new(CompressionMethod::Deflate, DosDateTime::now())
    }
}

#[async_trait]
impl ArchiveWriter for ZipArchiveWriter {
    async fn write_archive(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(self.compression, self.modified);
        for entry in entries {
            zip.add_file(entry.path, entry.data);
        }

        // Compression is CPU-bound, keep it off the async workers
        tokio::task::spawn_blocking(move || zip.finish()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::super::ZipReader;
    use super::*;

    fn writer(compression: CompressionMethod) -> ZipWriter {
        ZipWriter::new(compression, DosDateTime::new(2025, 6, 1, 12, 30, 0))
    }

    #[test]
    fn empty_archive_is_just_the_eocd() {
        let bytes = writer(CompressionMethod::Deflate).finish().unwrap();
        assert_eq!(bytes.len(), EndOfCentralDirectory::SIZE);

        let reader = ZipReader::new(&bytes).unwrap();
        assert!(reader.entries().unwrap().is_empty());
    }

    #[test]
    fn entries_read_back_in_order() {
        let mut zip = writer(CompressionMethod::Deflate);
        zip.add_file("src/main.rs", "fn main() {}\n".repeat(40));
        zip.add_file("empty.txt", "");
        zip.add_file("notes/ünïcode.md", "# hi");
        let bytes = zip.finish().unwrap();

        let reader = ZipReader::new(&bytes).unwrap();
        let entries = reader.entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["src/main.rs", "empty.txt", "notes/ünïcode.md"]);

        // Repetitive text compresses, tiny files are stored
        assert_eq!(entries[0].compression_method, CompressionMethod::Deflate);
        assert_eq!(entries[1].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[0].modified.ymd(), (2025, 6, 1));
        assert_eq!(entries[0].modified.hms(), (12, 30, 0));

        assert_eq!(
            reader.read(&entries[0]).unwrap(),
            "fn main() {}\n".repeat(40).into_bytes()
        );
        assert_eq!(reader.read(&entries[1]).unwrap(), b"");
        assert_eq!(reader.read_by_name("notes/ünïcode.md").unwrap(), b"# hi");
    }

    #[test]
    fn stored_mode_never_compresses() {
        let mut zip = writer(CompressionMethod::Stored);
        zip.add_file("a.txt", "a".repeat(1000));
        let bytes = zip.finish().unwrap();

        let reader = ZipReader::new(&bytes).unwrap();
        let entries = reader.entries().unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[0].compressed_size, 1000);
    }

    #[test]
    fn duplicate_name_replaces_data_in_place() {
        let mut zip = writer(CompressionMethod::Deflate);
        assert!(!zip.add_file("a", "first"));
        assert!(!zip.add_file("b", "other"));
        assert!(zip.add_file("a", "second"));
        assert_eq!(zip.len(), 2);

        let bytes = zip.finish().unwrap();
        let reader = ZipReader::new(&bytes).unwrap();
        let names: Vec<_> = reader
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(reader.read_by_name("a").unwrap(), b"second");
    }

    #[test]
    fn many_duplicates_keep_first_positions() {
        let mut zip = writer(CompressionMethod::Stored);
        for round in 0..3 {
            for i in 0..2000 {
                zip.add_file(format!("f{}.txt", i), format!("{}", round));
            }
        }
        assert_eq!(zip.len(), 2000);

        let bytes = zip.finish().unwrap();
        let reader = ZipReader::new(&bytes).unwrap();
        let entries = reader.entries().unwrap();
        assert_eq!(entries.len(), 2000);
        assert_eq!(entries[0].file_name, "f0.txt");
        assert_eq!(entries[1999].file_name, "f1999.txt");
        assert_eq!(reader.read(&entries[1234]).unwrap(), b"2");
    }

    #[test]
    fn unknown_compression_is_rejected() {
        let mut zip = writer(CompressionMethod::Unknown(12));
        zip.add_file("a", "x");
        assert!(zip.finish().is_err());
    }

    #[tokio::test]
    async fn archive_writer_serializes_entries() {
        let writer = ZipArchiveWriter::new(CompressionMethod::Deflate, DosDateTime::MIN);
        let bytes = writer
            .write_archive(vec![
                ArchiveEntry::new("x/y.txt", "y"),
                ArchiveEntry::new("README.md", "readme"),
            ])
            .await
            .unwrap();

        let reader = ZipReader::new(&bytes).unwrap();
        assert_eq!(reader.entries().unwrap().len(), 2);
        assert_eq!(reader.read_by_name("README.md").unwrap(), b"readme");
    }
}
