//! Value entry parsing and typed data extraction.
//!
//! A value entry is a `(type, name, data)` triple packed after its key name
//! entry inside a data block. An empty name denotes the default value of the
//! enclosing key.

use crate::codepage::Codepage;
use crate::error::{CregError, Result};
use crate::utils::{name_hash, names_equal, read_u16_le, read_u32_le};

/// Size of the value entry header in bytes.
pub const VALUE_ENTRY_HEADER_SIZE: usize = 12;

/// Registry value data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// No value type.
    None,

    /// String in the hive codepage (null-terminated).
    String,

    /// String with environment variables.
    ExpandString,

    /// Binary data.
    Binary,

    /// 32-bit little-endian integer.
    Dword,

    /// 32-bit big-endian integer.
    DwordBigEndian,

    /// Symbolic link string.
    Link,

    /// Multiple strings.
    MultiString,

    /// 64-bit little-endian integer.
    Qword,

    /// Unknown or non-standard value type, passed through as raw bytes.
    Unknown(u32),
}

impl ValueType {
    /// Parses a value type from its on-disk number.
    ///
    /// Types 0-7 and 11 are known; anything else is `Unknown` and its data
    /// is exposed as raw bytes.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiString,
            11 => ValueType::Qword,
            _ => ValueType::Unknown(value),
        }
    }

    /// Returns the on-disk number of this value type.
    pub fn to_u32(&self) -> u32 {
        match self {
            ValueType::None => 0,
            ValueType::String => 1,
            ValueType::ExpandString => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiString => 7,
            ValueType::Qword => 11,
            ValueType::Unknown(value) => *value,
        }
    }

    /// Returns the conventional name of this value type.
    pub fn name(&self) -> String {
        match self {
            ValueType::None => "REG_NONE".to_string(),
            ValueType::String => "REG_SZ".to_string(),
            ValueType::ExpandString => "REG_EXPAND_SZ".to_string(),
            ValueType::Binary => "REG_BINARY".to_string(),
            ValueType::Dword => "REG_DWORD".to_string(),
            ValueType::DwordBigEndian => "REG_DWORD_BIG_ENDIAN".to_string(),
            ValueType::Link => "REG_LINK".to_string(),
            ValueType::MultiString => "REG_MULTI_SZ".to_string(),
            ValueType::Qword => "REG_QWORD".to_string(),
            ValueType::Unknown(value) => format!("REG_UNKNOWN_{:#010x}", value),
        }
    }
}

/// One decoded value entry.
#[derive(Debug, Clone)]
pub struct ValueEntry {
    /// Value data type.
    pub value_type: ValueType,

    /// Value name bytes in the hive codepage. Empty for the default value.
    pub name: Vec<u8>,

    /// Raw value data bytes.
    pub data: Vec<u8>,

    /// Hive offset of this entry, for diagnostics.
    pub offset: u64,
}

impl ValueEntry {
    /// Parses a value entry from a byte slice.
    ///
    /// # Arguments
    ///
    /// * `data` - Bytes starting at the entry header; may extend beyond it.
    /// * `offset` - Hive offset of the entry, for error reporting.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is truncated or the declared name and
    /// data sizes exceed the slice.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        if data.len() < VALUE_ENTRY_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset,
                expected: VALUE_ENTRY_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let value_type = ValueType::from_u32(read_u32_le(data, 0x00)?);

        // 4 unknown bytes at 0x04
        let name_size = read_u16_le(data, 0x08)? as usize;
        let data_size = read_u16_le(data, 0x0A)? as usize;

        if name_size + data_size > data.len() - VALUE_ENTRY_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset,
                expected: VALUE_ENTRY_HEADER_SIZE + name_size + data_size,
                actual: data.len(),
            });
        }

        let name_start = VALUE_ENTRY_HEADER_SIZE;
        let data_start = name_start + name_size;

        Ok(ValueEntry {
            value_type,
            name: data[name_start..data_start].to_vec(),
            data: data[data_start..data_start + data_size].to_vec(),
            offset,
        })
    }

    /// Returns the total on-disk size of this entry.
    pub fn size(&self) -> usize {
        VALUE_ENTRY_HEADER_SIZE + self.name.len() + self.data.len()
    }

    /// Returns the name size in bytes.
    pub fn name_size(&self) -> usize {
        self.name.len()
    }

    /// Returns the raw name bytes.
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// Returns true for the default (unnamed) value of the enclosing key.
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    /// Returns the data size in bytes.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw data bytes.
    pub fn data_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decodes the name through the hive codepage.
    pub fn utf8_name(&self, codepage: Codepage) -> Result<String> {
        codepage.decode(&self.name, self.offset)
    }

    /// Decodes the name through the hive codepage as UTF-16 units.
    pub fn utf16_name(&self, codepage: Codepage) -> Result<Vec<u16>> {
        Ok(self.utf8_name(codepage)?.encode_utf16().collect())
    }

    /// Computes the registry hash of the stored name.
    ///
    /// Returns 0 when the name cannot be decoded through the codepage,
    /// which callers treat as "no hash" and fall back to a full compare.
    pub fn name_hash(&self, codepage: Codepage) -> u32 {
        match codepage.decode(&self.name, self.offset) {
            Ok(decoded) => name_hash(decoded.chars()),
            Err(_) => 0,
        }
    }

    /// Compares the stored name to a UTF-8 query, case-insensitively.
    ///
    /// A nonzero `query_hash` that differs from a nonzero stored hash rejects
    /// without a character compare. A name that cannot be decoded through
    /// the codepage never matches.
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

    /// Interprets the data as a 32-bit integer.
    ///
    /// Endianness follows the value type: `DwordBigEndian` is big-endian,
    /// everything else little-endian. Data that is not exactly 4 bytes is
    /// zero-padded or truncated and reported as corrupted.
    ///
    /// # Returns
    ///
    /// `(value, corrupted)`.
    pub fn to_u32(&self) -> (u32, bool) {
        let corrupted = self.data.len() != 4;

        let mut bytes = [0u8; 4];
        let len = self.data.len().min(4);
        bytes[..len].copy_from_slice(&self.data[..len]);

        let value = match self.value_type {
            ValueType::DwordBigEndian => u32::from_be_bytes(bytes),
            _ => u32::from_le_bytes(bytes),
        };

        (value, corrupted)
    }

    /// Interprets the data as a 64-bit little-endian integer.
    ///
    /// Data that is not exactly 8 bytes is zero-padded or truncated and
    /// reported as corrupted.
    ///
    /// # Returns
    ///
    /// `(value, corrupted)`.
    pub fn to_u64(&self) -> (u64, bool) {
        let corrupted = self.data.len() != 8;

        let mut bytes = [0u8; 8];
        let len = self.data.len().min(8);
        bytes[..len].copy_from_slice(&self.data[..len]);

        (u64::from_le_bytes(bytes), corrupted)
    }

    /// Decodes the data as a string through the hive codepage.
    ///
    /// Trailing null terminators are trimmed; empty data yields an empty
    /// string.
    pub fn to_string_data(&self, codepage: Codepage) -> Result<String> {
        let decoded = codepage.decode(&self.data, self.offset)?;
        Ok(decoded.trim_end_matches('\0').to_string())
    }

    /// Decodes the data as a string and re-encodes it as UTF-16 units.
    pub fn to_utf16_string_data(&self, codepage: Codepage) -> Result<Vec<u16>> {
        Ok(self.to_string_data(codepage)?.encode_utf16().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_entry(value_type: u32, name: &[u8], data: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&value_type.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u16).to_le_bytes());
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_value_type_round_trip() {
        for number in [0, 1, 2, 3, 4, 5, 6, 7, 11] {
            assert_eq!(ValueType::from_u32(number).to_u32(), number);
        }
        assert!(matches!(ValueType::from_u32(9), ValueType::Unknown(9)));
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(ValueType::String.name(), "REG_SZ");
        assert_eq!(ValueType::Dword.name(), "REG_DWORD");
        assert_eq!(ValueType::Qword.name(), "REG_QWORD");
        assert_eq!(ValueType::Unknown(9).name(), "REG_UNKNOWN_0x00000009");
    }

    #[test]
    fn test_parse_minimum_size() {
        let data = vec![0u8; 11];
        assert!(ValueEntry::parse(&data, 0).is_err());
    }

    #[test]
    fn test_parse_declared_sizes_exceed_slice() {
        let mut bytes = build_entry(1, b"Name", b"data");
        bytes.truncate(bytes.len() - 2);
        assert!(ValueEntry::parse(&bytes, 0).is_err());
    }

    #[test]
    fn test_parse_string_value() {
        let bytes = build_entry(1, b"ProductName", b"Windows\0");
        let entry = ValueEntry::parse(&bytes, 0).unwrap();

        assert_eq!(entry.value_type, ValueType::String);
        assert_eq!(entry.name_bytes(), b"ProductName");
        assert_eq!(entry.size(), bytes.len());
        assert_eq!(
            entry.to_string_data(Codepage::Windows1252).unwrap(),
            "Windows"
        );
    }

    #[test]
    fn test_default_value() {
        let bytes = build_entry(1, b"", b"default");
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        assert!(entry.is_default());
        assert_eq!(entry.name_size(), 0);
    }

    #[test]
    fn test_to_u32_little_endian() {
        let bytes = build_entry(4, b"V", &[0x78, 0x56, 0x34, 0x12]);
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        assert_eq!(entry.to_u32(), (0x12345678, false));
    }

    #[test]
    fn test_to_u32_big_endian() {
        let bytes = build_entry(5, b"V", &[0x12, 0x34, 0x56, 0x78]);
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        assert_eq!(entry.to_u32(), (0x12345678, false));
    }

    #[test]
    fn test_to_u32_short_data_is_corrupted() {
        let bytes = build_entry(4, b"V", &[0x01, 0x02, 0x03]);
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        assert_eq!(entry.to_u32(), (0x030201, true));
    }

    #[test]
    fn test_to_u64() {
        let bytes = build_entry(11, b"V", &[1, 0, 0, 0, 0, 0, 0, 0]);
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        assert_eq!(entry.to_u64(), (1, false));

        let bytes = build_entry(11, b"V", &[1, 0]);
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        assert_eq!(entry.to_u64(), (1, true));
    }

    #[test]
    fn test_compare_name_case_insensitive() {
        let bytes = build_entry(1, b"ProductName", b"");
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        let cp = Codepage::Windows1252;

        assert!(entry.compare_name_with_utf8("productname", cp, 0));
        assert!(entry.compare_name_with_utf8("PRODUCTNAME", cp, 0));
        assert!(!entry.compare_name_with_utf8("ProductNam", cp, 0));
    }

    #[test]
    fn test_compare_name_hash_reject() {
        let bytes = build_entry(1, b"ProductName", b"");
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        let cp = Codepage::Windows1252;

        let wrong_hash = crate::utils::name_hash("Other".chars());
        assert!(!entry.compare_name_with_utf8("ProductName", cp, wrong_hash));

        let right_hash = crate::utils::name_hash("ProductName".chars());
        assert!(entry.compare_name_with_utf8("ProductName", cp, right_hash));
    }

    #[test]
    fn test_compare_name_utf16() {
        let bytes = build_entry(1, b"ProductName", b"");
        let entry = ValueEntry::parse(&bytes, 0).unwrap();
        let query: Vec<u16> = "productNAME".encode_utf16().collect();
        assert!(entry.compare_name_with_utf16(&query, Codepage::Windows1252, 0));
    }
}
