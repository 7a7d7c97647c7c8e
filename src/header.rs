//! CREG file header parsing.
//!
//! The file header is the first 32 bytes of a hive. It carries the format
//! version, the offset of the key navigation area and an advertised data
//! block count. The advertised count is informational; the true count comes
//! from scanning the data block list.

use crate::error::{CregError, Result};
use crate::utils::{read_u16_le, read_u32_le};
use std::fmt;

/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: usize = 32;

/// Expected signature for a valid CREG hive.
pub const CREG_SIGNATURE: &[u8; 4] = b"CREG";

/// CREG file header.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Signature, should be "CREG".
    pub signature: [u8; 4],

    /// Minor version of the hive format.
    pub minor_version: u16,

    /// Major version of the hive format.
    pub major_version: u16,

    /// Offset of the key navigation area (RGKN).
    pub navigation_offset: u32,

    /// Advertised number of data blocks.
    pub data_block_count: u16,
}

impl FileHeader {
    /// Parses a file header from raw bytes.
    ///
    /// Only the signature is validated here; the version check belongs to
    /// the file open path and the advertised count is not trusted.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too small or the signature is not
    /// "CREG".
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset: 0,
                expected: FILE_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut signature = [0u8; 4];
        signature.copy_from_slice(&data[0..4]);

        if &signature != CREG_SIGNATURE {
            return Err(CregError::invalid_signature(CREG_SIGNATURE, &signature));
        }

        let minor_version = read_u16_le(data, 0x04)?;
        let major_version = read_u16_le(data, 0x06)?;
        let navigation_offset = read_u32_le(data, 0x08)?;

        // 4 unknown bytes at 0x0C
        let data_block_count = read_u16_le(data, 0x10)?;

        // Remaining bytes up to 0x20 are reserved and treated as opaque.

        Ok(FileHeader {
            signature,
            minor_version,
            major_version,
            navigation_offset,
            data_block_count,
        })
    }
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CREG File Header:\n\
             - Version: {}.{}\n\
             - Navigation Offset: {:#x}\n\
             - Advertised Data Blocks: {}",
            self.major_version,
            self.minor_version,
            self.navigation_offset,
            self.data_block_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_header() -> Vec<u8> {
        let mut data = vec![0u8; FILE_HEADER_SIZE];
        data[0..4].copy_from_slice(b"CREG");
        data[0x04..0x06].copy_from_slice(&0u16.to_le_bytes()); // minor
        data[0x06..0x08].copy_from_slice(&1u16.to_le_bytes()); // major
        data[0x08..0x0C].copy_from_slice(&0x20u32.to_le_bytes());
        data[0x10..0x12].copy_from_slice(&1u16.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_valid() {
        let header = FileHeader::parse(&valid_header()).unwrap();
        assert_eq!(&header.signature, b"CREG");
        assert_eq!(header.major_version, 1);
        assert_eq!(header.minor_version, 0);
        assert_eq!(header.navigation_offset, 0x20);
        assert_eq!(header.data_block_count, 1);
    }

    #[test]
    fn test_invalid_signature() {
        let mut data = valid_header();
        data[0..4].copy_from_slice(b"XXXX");

        let result = FileHeader::parse(&data);
        assert!(matches!(
            result.unwrap_err(),
            CregError::InvalidSignature { .. }
        ));
    }

    #[test]
    fn test_too_small() {
        let data = vec![0u8; 16];
        assert!(matches!(
            FileHeader::parse(&data).unwrap_err(),
            CregError::TruncatedData { .. }
        ));
    }
}
