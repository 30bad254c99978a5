//! ZIP archive reader over an in-memory byte slice.
//!
//! ## Reading Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the archive's end
//! 2. Read the Central Directory to get metadata for all entries
//! 3. For extraction, read each entry's Local File Header and data
//!
//! Used to check archives right after they are written.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};

use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Read-only view of a complete ZIP archive
pub struct ZipReader<'a> {
    data: &'a [u8],
    eocd: EndOfCentralDirectory,
}

impl<'a> ZipReader<'a> {
    /// Locate the EOCD record of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid EOCD can be found, or if the archive
    /// needs ZIP64 extensions.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let eocd = find_eocd(data)?;
        if eocd.is_zip64() {
            bail!("ZIP64 archives are not supported");
        }
        Ok(Self { data, eocd })
    }

    /// List all entries from the Central Directory.
    pub fn entries(&self) -> Result<Vec<ZipFileEntry>> {
        let start = self.eocd.cd_offset as usize;
        let end = start + self.eocd.cd_size as usize;
        let Some(cd_data) = self.data.get(start..end) else {
            bail!("Central Directory out of bounds");
        };

        let mut entries = Vec::with_capacity(self.eocd.total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..self.eocd.total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Extract an entry's data, verifying size and CRC-32.
    pub fn read(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let offset = entry.lfh_offset as usize;
        let Some(lfh) = self.data.get(offset..offset + LFH_SIZE) else {
            bail!("Local File Header out of bounds: {}", entry.file_name);
        };

        // Verify LFH signature (PK\x03\x04)
        if &lfh[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header: {}", entry.file_name);
        }

        // Variable field lengths sit at fixed positions in the LFH
        let mut cursor = Cursor::new(lfh);
        cursor.set_position(26);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as usize;

        let data_start = offset + LFH_SIZE + file_name_length + extra_field_length;
        let data_end = data_start + entry.compressed_size as usize;
        let Some(raw) = self.data.get(data_start..data_end) else {
            bail!("Entry data out of bounds: {}", entry.file_name);
        };

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(raw).read_to_end(&mut out)?;
                out
            }
            CompressionMethod::Unknown(v) => {
                bail!("Unsupported compression method: {}", v)
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {}, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC mismatch for {}", entry.file_name);
        }

        Ok(data)
    }

    /// Extract the entry named `name`.
    pub fn read_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let entries = self.entries()?;
        let Some(entry) = entries.iter().find(|e| e.file_name == name) else {
            bail!("Entry not found: {}", name);
        };
        self.read(entry)
    }
}

/// Find and parse the End of Central Directory record.
///
/// Tries the common no-comment layout first, then searches backwards for
/// the signature of an EOCD whose comment length matches the remaining bytes.
fn find_eocd(data: &[u8]) -> Result<EndOfCentralDirectory> {
    if data.len() < EndOfCentralDirectory::SIZE {
        bail!("Not a valid ZIP file");
    }

    let tail = &data[data.len() - EndOfCentralDirectory::SIZE..];
    if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && &tail[20..22] == b"\x00\x00" {
        return EndOfCentralDirectory::from_bytes(tail);
    }

    let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(data.len());
    let buf = &data[data.len() - search_size..];

    for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
        if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                return EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE]);
            }
        }
    }

    bail!("Not a valid ZIP file")
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    // Read and verify the signature (PK\x01\x02)
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let time = cursor.read_u16::<LittleEndian>()?;
    let date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
    let is_directory = file_name.ends_with('/');

    // Extra field and comment are not used
    cursor.set_position(cursor.position() + extra_field_length as u64 + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        modified: DosDateTime { time, date },
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::ZipWriter;

    fn sample() -> Vec<u8> {
        let mut zip = ZipWriter::new(CompressionMethod::Deflate, DosDateTime::MIN);
        zip.add_file("a.txt", "alpha");
        zip.add_file("dir/", "");
        zip.finish().unwrap()
    }

    #[test]
    fn rejects_non_zip_data() {
        assert!(ZipReader::new(b"hello").is_err());
        assert!(ZipReader::new(&[0u8; 64]).is_err());
    }

    #[test]
    fn finds_eocd_behind_a_comment() {
        let mut bytes = sample();
        let len = bytes.len();
        // Patch the comment length and append the comment
        bytes[len - 2..].copy_from_slice(&7u16.to_le_bytes());
        bytes.extend_from_slice(b"comment");

        let reader = ZipReader::new(&bytes).unwrap();
        let entries = reader.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].is_directory);
        assert_eq!(reader.read_by_name("a.txt").unwrap(), b"alpha");
    }

    #[test]
    fn detects_corrupted_data() {
        let mut bytes = sample();
        // First entry data follows its 30 byte header and 5 byte name
        bytes[LFH_SIZE + 5] ^= 0xFF;

        let reader = ZipReader::new(&bytes).unwrap();
        let err = reader.read_by_name("a.txt").unwrap_err();
        assert!(err.to_string().contains("CRC mismatch"));
    }

    #[test]
    fn missing_entry_is_an_error() {
        let bytes = sample();
        let reader = ZipReader::new(&bytes).unwrap();
        assert!(reader.read_by_name("nope").is_err());
    }
}
