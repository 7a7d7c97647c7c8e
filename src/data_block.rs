//! Data block (RGDB) parsing.
//!
//! Data blocks form a linear list after the key navigation area. Each block
//! carries a packed sequence of key name entries, looked up by identifier
//! rather than position.

use crate::error::{CregError, Result};
use crate::key_name_entry::{KeyNameEntry, KEY_NAME_ENTRY_HEADER_SIZE};
use crate::utils::{read_u16_le, read_u32_le};
use tracing::debug;

/// Size of the data block header in bytes.
pub const DATA_BLOCK_HEADER_SIZE: usize = 32;

/// Expected signature for data blocks ("RGDB").
pub const RGDB_SIGNATURE: &[u8; 4] = b"RGDB";

/// Sanity bound on a single data block's declared size.
pub const MEMORY_MAXIMUM: u32 = 1024 * 1024 * 1024;

/// Data block header.
#[derive(Debug, Clone)]
pub struct DataBlockHeader {
    /// Hive offset of this block.
    pub offset: u64,

    /// Total size of the block in bytes, including the header.
    pub size: u32,

    /// Unused size in bytes.
    pub unused_size: u32,

    /// Used size of the entries region in bytes.
    pub used_size: u32,

    /// Block index.
    pub index: u16,
}

impl DataBlockHeader {
    /// Parses a data block header from raw bytes.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the signature is not "RGDB", signalling the end of
    /// the data block list rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too small or the declared sizes are
    /// out of bounds.
    pub fn parse(data: &[u8], offset: u64) -> Result<Option<Self>> {
        if data.len() < DATA_BLOCK_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset,
                expected: DATA_BLOCK_HEADER_SIZE,
                actual: data.len(),
            });
        }

        if &data[0..4] != RGDB_SIGNATURE {
            return Ok(None);
        }

        let size = read_u32_le(data, 0x04)?;
        let unused_size = read_u32_le(data, 0x08)?;

        // 2 unknown bytes at 0x0C
        let index = read_u16_le(data, 0x0E)?;
        let used_size = read_u32_le(data, 0x10)?;

        // Remaining bytes up to 0x20 are reserved.

        if size as usize <= DATA_BLOCK_HEADER_SIZE || size > MEMORY_MAXIMUM {
            return Err(CregError::format_error(format!(
                "invalid data block size {} at offset {:#x}",
                size, offset
            )));
        }

        if used_size > size - DATA_BLOCK_HEADER_SIZE as u32 {
            return Err(CregError::format_error(format!(
                "invalid data block used size {} at offset {:#x}",
                used_size, offset
            )));
        }

        Ok(Some(DataBlockHeader {
            offset,
            size,
            unused_size,
            used_size,
            index,
        }))
    }
}

/// A fully decoded data block.
#[derive(Debug, Clone)]
pub struct DataBlock {
    /// Parsed block header.
    pub header: DataBlockHeader,

    /// Decoded key name entries, keyed by their identifier.
    entries: Vec<KeyNameEntry>,
}

impl DataBlock {
    /// Parses the key name entries of a data block.
    ///
    /// # Arguments
    ///
    /// * `header` - The block header parsed beforehand.
    /// * `data` - The entries region, `size - 32` bytes read after the
    ///   header.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry declares sizes that violate the region
    /// bounds.
    pub fn parse_entries(header: DataBlockHeader, data: &[u8]) -> Result<Self> {
        let cap = (header.used_size as usize).min(data.len());
        let mut entries = Vec::new();
        let mut data_offset = 0usize;

        while data_offset + KEY_NAME_ENTRY_HEADER_SIZE <= cap {
            let entry_offset = header.offset + DATA_BLOCK_HEADER_SIZE as u64 + data_offset as u64;

            match KeyNameEntry::parse(&data[data_offset..], entry_offset)? {
                None => break,
                Some(entry) => {
                    data_offset += entry.size as usize;
                    entries.push(entry);
                }
            }
        }

        debug!(
            index = header.index,
            entries = entries.len(),
            "Parsed data block entries"
        );

        Ok(DataBlock { header, entries })
    }

    /// Returns the number of decoded key name entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Looks up a key name entry by its identifier.
    ///
    /// Identifiers are sparse, so this is a linear scan over the stored
    /// entries.
    pub fn entry_by_identifier(&self, identifier: u16) -> Option<&KeyNameEntry> {
        self.entries.iter().find(|entry| entry.index == identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_name_entry::KEY_NAME_ENTRY_TERMINATOR;

    fn build_header(size: u32, used_size: u32, index: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; DATA_BLOCK_HEADER_SIZE];
        bytes[0..4].copy_from_slice(b"RGDB");
        bytes[0x04..0x08].copy_from_slice(&size.to_le_bytes());
        bytes[0x0E..0x10].copy_from_slice(&index.to_le_bytes());
        bytes[0x10..0x14].copy_from_slice(&used_size.to_le_bytes());
        bytes
    }

    fn build_key_name_entry(index: u16, name: &[u8]) -> Vec<u8> {
        let size = (KEY_NAME_ENTRY_HEADER_SIZE + name.len()) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&index.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 2]);
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        bytes.extend_from_slice(name);
        bytes
    }

    #[test]
    fn test_header_not_a_data_block() {
        let mut bytes = build_header(64, 0, 0);
        bytes[0..4].copy_from_slice(b"RGKN");
        assert!(DataBlockHeader::parse(&bytes, 0).unwrap().is_none());
    }

    #[test]
    fn test_header_invalid_size() {
        let bytes = build_header(16, 0, 0);
        assert!(DataBlockHeader::parse(&bytes, 0).is_err());

        let bytes = build_header(MEMORY_MAXIMUM + 1, 0, 0);
        assert!(DataBlockHeader::parse(&bytes, 0).is_err());
    }

    #[test]
    fn test_header_invalid_used_size() {
        let bytes = build_header(64, 64, 0);
        assert!(DataBlockHeader::parse(&bytes, 0).is_err());
    }

    #[test]
    fn test_parse_entries_and_lookup() {
        let first = build_key_name_entry(1, b"Software");
        let second = build_key_name_entry(3, b"System");
        let used = (first.len() + second.len()) as u32;

        let mut region = Vec::new();
        region.extend_from_slice(&first);
        region.extend_from_slice(&second);

        let header_bytes = build_header(DATA_BLOCK_HEADER_SIZE as u32 + used, used, 0);
        let header = DataBlockHeader::parse(&header_bytes, 0).unwrap().unwrap();
        let block = DataBlock::parse_entries(header, &region).unwrap();

        assert_eq!(block.entry_count(), 2);
        assert_eq!(
            block.entry_by_identifier(1).unwrap().name_bytes(),
            b"Software"
        );
        assert_eq!(
            block.entry_by_identifier(3).unwrap().name_bytes(),
            b"System"
        );
        assert!(block.entry_by_identifier(2).is_none());
    }

    #[test]
    fn test_parse_entries_stops_at_terminator() {
        let first = build_key_name_entry(1, b"Software");
        let terminator = build_key_name_entry(KEY_NAME_ENTRY_TERMINATOR, b"");
        let trailing = build_key_name_entry(2, b"Ignored");

        let mut region = Vec::new();
        region.extend_from_slice(&first);
        region.extend_from_slice(&terminator);
        region.extend_from_slice(&trailing);

        let used = region.len() as u32;
        let header_bytes = build_header(DATA_BLOCK_HEADER_SIZE as u32 + used, used, 0);
        let header = DataBlockHeader::parse(&header_bytes, 0).unwrap().unwrap();
        let block = DataBlock::parse_entries(header, &region).unwrap();

        assert_eq!(block.entry_count(), 1);
    }
}
