//! Key navigation (RGKN) header and key hierarchy entry parsing.
//!
//! The key navigation area holds fixed-size hierarchy records forming the
//! parent/sibling/child tree. Record offsets are relative to the start of
//! the hierarchy entries region and resolve to a record index by dividing
//! by the record stride.

use crate::error::{CregError, Result};
use crate::utils::{read_u16_le, read_u32_le};

/// Size of the key navigation header in bytes.
pub const KEY_NAVIGATION_HEADER_SIZE: usize = 32;

/// Expected signature for the key navigation area ("RGKN").
pub const RGKN_SIGNATURE: &[u8; 4] = b"RGKN";

/// Size of one key hierarchy entry in bytes; also the area stride.
pub const KEY_HIERARCHY_ENTRY_SIZE: usize = 28;

/// Sentinel offset meaning "none" in parent/child/sibling links.
pub const NO_OFFSET: u32 = 0xFFFFFFFF;

/// Returns true if a hierarchy link offset terminates a chain.
#[inline]
pub fn is_end_offset(offset: u32) -> bool {
    offset == 0 || offset == NO_OFFSET
}

/// Key navigation (RGKN) header.
#[derive(Debug, Clone)]
pub struct KeyNavigationHeader {
    /// Size of the key navigation area in bytes, including this header.
    pub size: u32,

    /// Offset of the hierarchy entries region, relative to the area start.
    pub entries_data_offset: u32,
}

impl KeyNavigationHeader {
    /// Parses a key navigation header from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignature` if the data does not start with "RGKN",
    /// or a format error if the declared size cannot hold the header.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        if data.len() < KEY_NAVIGATION_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset,
                expected: KEY_NAVIGATION_HEADER_SIZE,
                actual: data.len(),
            });
        }

        if &data[0..4] != RGKN_SIGNATURE {
            return Err(CregError::invalid_signature(RGKN_SIGNATURE, &data[0..4]));
        }

        let size = read_u32_le(data, 0x04)?;
        let entries_data_offset = read_u32_le(data, 0x08)?;

        // Remaining bytes up to 0x20 are reserved.

        if (size as usize) < KEY_NAVIGATION_HEADER_SIZE {
            return Err(CregError::format_error(format!(
                "invalid key navigation size {} at offset {:#x}",
                size, offset
            )));
        }

        Ok(KeyNavigationHeader {
            size,
            entries_data_offset,
        })
    }
}

/// One fixed-size key hierarchy record.
#[derive(Debug, Clone)]
pub struct KeyHierarchyEntry {
    /// Offset of this record, relative to the hierarchy entries region.
    pub offset: u32,

    /// On-disk hash of the key name.
    pub name_hash: u32,

    /// Offset of the parent record, or a sentinel.
    pub parent_offset: u32,

    /// Offset of the first child record, or a sentinel.
    pub first_child_offset: u32,

    /// Offset of the next sibling record, or a sentinel.
    pub next_sibling_offset: u32,

    /// Identifier of the key name entry within its data block.
    pub key_name_entry_index: u16,

    /// Data block number; negative (as i16) means no associated entry.
    pub data_block_number: u16,
}

impl KeyHierarchyEntry {
    /// Parses a key hierarchy entry from a borrowed slice.
    ///
    /// # Arguments
    ///
    /// * `data` - Exactly one record's bytes.
    /// * `offset` - Record offset relative to the hierarchy entries region.
    pub fn parse(data: &[u8], offset: u32) -> Result<Self> {
        if data.len() < KEY_HIERARCHY_ENTRY_SIZE {
            return Err(CregError::TruncatedData {
                offset: offset as u64,
                expected: KEY_HIERARCHY_ENTRY_SIZE,
                actual: data.len(),
            });
        }

        // 4 unknown bytes at 0x00
        let name_hash = read_u32_le(data, 0x04)?;

        // 4 unknown bytes at 0x08
        let parent_offset = read_u32_le(data, 0x0C)?;
        let first_child_offset = read_u32_le(data, 0x10)?;
        let next_sibling_offset = read_u32_le(data, 0x14)?;
        let key_name_entry_index = read_u16_le(data, 0x18)?;
        let data_block_number = read_u16_le(data, 0x1A)?;

        Ok(KeyHierarchyEntry {
            offset,
            name_hash,
            parent_offset,
            first_child_offset,
            next_sibling_offset,
            key_name_entry_index,
            data_block_number,
        })
    }

    /// Returns true if this record refers to a key name entry.
    ///
    /// The data block number is signed-interpreted; a negative value (the
    /// synthetic root writes `0xFFFF`) means the record has no name entry.
    pub fn has_key_name_entry(&self) -> bool {
        (self.data_block_number as i16) >= 0
    }
}
