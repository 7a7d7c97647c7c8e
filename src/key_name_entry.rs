//! Key name entry parsing.
//!
//! A key name entry is the on-disk record inside a data block that carries a
//! key's name and its packed list of value entries. A hierarchy record points
//! at it by `(data_block_number, key_name_entry_index)`.

use crate::codepage::Codepage;
use crate::error::{CregError, Result};
use crate::utils::{name_hash, names_equal, read_u16_le, read_u32_le};
use crate::value_entry::ValueEntry;

/// Size of the key name entry header in bytes.
pub const KEY_NAME_ENTRY_HEADER_SIZE: usize = 20;

/// Index value marking a free/terminator slot, ending the entry chain.
pub const KEY_NAME_ENTRY_TERMINATOR: u16 = 0xFFFF;

/// One decoded key name entry with its value entries.
#[derive(Debug, Clone)]
pub struct KeyNameEntry {
    /// Total on-disk size of the entry in bytes.
    pub size: u32,

    /// Identifier of this entry within its data block.
    pub index: u16,

    /// Used size in bytes; caps the value entry parse.
    pub used_size: u32,

    /// Key name bytes in the hive codepage.
    pub name: Vec<u8>,

    /// Declared number of values; may exceed the decoded count when the
    /// used size caps the parse.
    pub declared_value_count: u16,

    /// Decoded value entries in stable on-disk order.
    values: Vec<ValueEntry>,

    /// Hive offset of this entry, for diagnostics.
    pub offset: u64,
}

impl KeyNameEntry {
    /// Parses a key name entry from a data block region.
    ///
    /// # Arguments
    ///
    /// * `data` - Remaining region bytes, starting at this entry's header.
    /// * `offset` - Hive offset of the entry, for error reporting.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the entry is a terminator slot (index `0xFFFF`),
    /// which ends the chain without an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared sizes violate the entry bounds.
    pub fn parse(data: &[u8], offset: u64) -> Result<Option<Self>> {
        if data.len() < KEY_NAME_ENTRY_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset,
                expected: KEY_NAME_ENTRY_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let size = read_u32_le(data, 0x00)?;
        let index = read_u16_le(data, 0x04)?;

        if index == KEY_NAME_ENTRY_TERMINATOR {
            return Ok(None);
        }

        // 2 unknown bytes at 0x06
        let used_size = read_u32_le(data, 0x08)?;
        let name_size = read_u16_le(data, 0x0C)? as usize;
        let value_count = read_u16_le(data, 0x0E)? as usize;

        // 4 unknown bytes at 0x10

        if (size as usize) < KEY_NAME_ENTRY_HEADER_SIZE || size as usize > data.len() {
            return Err(CregError::format_error(format!(
                "invalid key name entry size {} at offset {:#x}",
                size, offset
            )));
        }

        if (used_size as usize) < KEY_NAME_ENTRY_HEADER_SIZE || used_size > size {
            return Err(CregError::format_error(format!(
                "invalid key name entry used size {} at offset {:#x}",
                used_size, offset
            )));
        }

        if name_size > size as usize - KEY_NAME_ENTRY_HEADER_SIZE {
            return Err(CregError::format_error(format!(
                "invalid key name size {} at offset {:#x}",
                name_size, offset
            )));
        }

        let name = data[KEY_NAME_ENTRY_HEADER_SIZE..KEY_NAME_ENTRY_HEADER_SIZE + name_size]
            .to_vec();

        // The used size caps the value parse; trailing bytes within the
        // declared size are ignored.
        let cap = (used_size as usize).min(data.len());
        let mut values = Vec::with_capacity(value_count);
        let mut value_offset = KEY_NAME_ENTRY_HEADER_SIZE + name_size;

        for _ in 0..value_count {
            if value_offset >= cap {
                break;
            }

            let entry = ValueEntry::parse(&data[value_offset..cap], offset + value_offset as u64)?;
            value_offset += entry.size();
            values.push(entry);
        }

        Ok(Some(KeyNameEntry {
            size,
            index,
            used_size,
            name,
            declared_value_count: value_count as u16,
            values,
            offset,
        }))
    }

    /// Returns the name size in bytes.
    pub fn name_size(&self) -> usize {
        self.name.len()
    }

    /// Returns the raw name bytes.
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// Decodes the name through the hive codepage.
    pub fn utf8_name(&self, codepage: Codepage) -> Result<String> {
        codepage.decode(&self.name, self.offset)
    }

    /// Decodes the name through the hive codepage as UTF-16 units.
    pub fn utf16_name(&self, codepage: Codepage) -> Result<Vec<u16>> {
        Ok(self.utf8_name(codepage)?.encode_utf16().collect())
    }

    /// Returns the number of decoded value entries.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Returns the value entry at the given index, in stable on-disk order.
    pub fn value_at(&self, index: usize) -> Option<&ValueEntry> {
        self.values.get(index)
    }

    /// Returns all value entries.
    pub fn values(&self) -> &[ValueEntry] {
        &self.values
    }

    /// Returns true if the used size cut the value parse short of the
    /// declared count.
    pub fn values_truncated(&self) -> bool {
        (self.values.len() as u16) < self.declared_value_count
    }

    /// Computes the registry hash of the stored name.
    ///
    /// Returns 0 when the name cannot be decoded, which callers treat as
    /// "no hash" and fall back to a full compare.
    pub fn name_hash(&self, codepage: Codepage) -> u32 {
        match codepage.decode(&self.name, self.offset) {
            Ok(decoded) => name_hash(decoded.chars()),
            Err(_) => 0,
        }
    }

    /// Compares the stored name to a UTF-8 query, case-insensitively.
    ///
    /// A nonzero `query_hash` that differs from a nonzero stored hash rejects
    /// without a character compare.
    pub fn compare_name_with_utf8(
        &self,
        query: &str,
        codepage: Codepage,
        query_hash: u32,
    ) -> bool {
        let stored_hash = self.name_hash(codepage);

        if query_hash != 0 && stored_hash != 0 && query_hash != stored_hash {
            return false;
        }

        match codepage.decode(&self.name, self.offset) {
            Ok(stored) => names_equal(stored.chars(), query.chars()),
            Err(_) => false,
        }
    }

    /// Compares the stored name to a UTF-16 query, case-insensitively.
    pub fn compare_name_with_utf16(
        &self,
        query: &[u16],
        codepage: Codepage,
        query_hash: u32,
    ) -> bool {
        match crate::codepage::utf16_to_string(query) {
            Ok(query) => self.compare_name_with_utf8(&query, codepage, query_hash),
            Err(_) => false,
        }
    }
}
