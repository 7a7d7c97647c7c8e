//! Synthetic hive builder shared by the integration tests.
//!
//! Builds byte-exact CREG images: a 32-byte file header, an RGKN area whose
//! hierarchy records start right after its header, then a linear list of
//! RGDB data blocks.

// Each integration test target uses its own subset of these helpers.
#![allow(dead_code)]

use creg_parser::utils::name_hash;

/// Sentinel for "no parent/child/sibling".
pub const NONE: u32 = 0xFFFFFFFF;

/// Data block number marking a record with no key name entry.
pub const NO_BLOCK: u16 = 0xFFFF;

const FILE_HEADER_SIZE: usize = 32;
const RGKN_HEADER_SIZE: usize = 32;
const RGDB_HEADER_SIZE: usize = 32;
pub const RECORD_SIZE: usize = 28;

/// Computes the on-disk name hash for a key name.
pub fn hash_of(name: &str) -> u32 {
    name_hash(name.chars())
}

/// Builds one 28-byte hierarchy record.
pub fn hierarchy_record(
    name_hash: u32,
    parent: u32,
    first_child: u32,
    next_sibling: u32,
    entry_index: u16,
    block_number: u16,
) -> Vec<u8> {
    let mut bytes = vec![0u8; RECORD_SIZE];
    bytes[0x04..0x08].copy_from_slice(&name_hash.to_le_bytes());
    bytes[0x0C..0x10].copy_from_slice(&parent.to_le_bytes());
    bytes[0x10..0x14].copy_from_slice(&first_child.to_le_bytes());
    bytes[0x14..0x18].copy_from_slice(&next_sibling.to_le_bytes());
    bytes[0x18..0x1A].copy_from_slice(&entry_index.to_le_bytes());
    bytes[0x1A..0x1C].copy_from_slice(&block_number.to_le_bytes());
    bytes
}

/// Builds one value entry: 12-byte header, name bytes, data bytes.
pub fn value_entry(value_type: u32, name: &[u8], data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&value_type.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(data.len() as u16).to_le_bytes());
    bytes.extend_from_slice(name);
    bytes.extend_from_slice(data);
    bytes
}

/// Builds one key name entry with its packed values.
pub fn key_name_entry(index: u16, name: &[u8], values: &[Vec<u8>]) -> Vec<u8> {
    let values_size: usize = values.iter().map(Vec::len).sum();
    let size = (20 + name.len() + values_size) as u32;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(&index.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 2]);
    bytes.extend_from_slice(&size.to_le_bytes()); // used size
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(values.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend_from_slice(name);
    for value in values {
        bytes.extend_from_slice(value);
    }
    bytes
}

/// Builds one RGDB data block around a set of key name entries.
pub fn data_block(index: u16, entries: &[Vec<u8>]) -> Vec<u8> {
    let entries_size: usize = entries.iter().map(Vec::len).sum();
    let size = (RGDB_HEADER_SIZE + entries_size) as u32;

    let mut bytes = vec![0u8; RGDB_HEADER_SIZE];
    bytes[0..4].copy_from_slice(b"RGDB");
    bytes[0x04..0x08].copy_from_slice(&size.to_le_bytes());
    bytes[0x0E..0x10].copy_from_slice(&index.to_le_bytes());
    bytes[0x10..0x14].copy_from_slice(&(entries_size as u32).to_le_bytes());
    for entry in entries {
        bytes.extend_from_slice(entry);
    }
    bytes
}

/// Assembles a whole hive image from hierarchy records and data blocks.
///
/// Record `i` lands at offset `28 * i` relative to the entries region, so
/// sibling/child links in the records use those offsets.
pub fn build_hive(records: &[Vec<u8>], blocks: &[Vec<u8>]) -> Vec<u8> {
    let records_size: usize = records.iter().map(Vec::len).sum();
    let rgkn_size = (RGKN_HEADER_SIZE + records_size) as u32;

    let mut image = vec![0u8; FILE_HEADER_SIZE];
    image[0..4].copy_from_slice(b"CREG");
    image[0x04..0x06].copy_from_slice(&0u16.to_le_bytes()); // minor
    image[0x06..0x08].copy_from_slice(&1u16.to_le_bytes()); // major
    image[0x08..0x0C].copy_from_slice(&(FILE_HEADER_SIZE as u32).to_le_bytes());
    image[0x10..0x12].copy_from_slice(&(blocks.len() as u16).to_le_bytes());

    let mut rgkn = vec![0u8; RGKN_HEADER_SIZE];
    rgkn[0..4].copy_from_slice(b"RGKN");
    rgkn[0x04..0x08].copy_from_slice(&rgkn_size.to_le_bytes());
    rgkn[0x08..0x0C].copy_from_slice(&(RGKN_HEADER_SIZE as u32).to_le_bytes());
    image.extend_from_slice(&rgkn);

    for record in records {
        image.extend_from_slice(record);
    }

    for block in blocks {
        image.extend_from_slice(block);
    }

    image
}

/// S1: a hive holding only the synthetic root.
pub fn minimal_hive() -> Vec<u8> {
    let root = hierarchy_record(0, NONE, NONE, NONE, 0, NO_BLOCK);
    build_hive(&[root], &[])
}

/// S2: root -> "Software" with one string value "ProductName" = "Windows".
pub fn one_key_hive() -> Vec<u8> {
    let root = hierarchy_record(0, NONE, RECORD_SIZE as u32, NONE, 0, NO_BLOCK);
    let software = hierarchy_record(hash_of("Software"), 0, NONE, NONE, 1, 0);

    let value = value_entry(1, b"ProductName", b"Windows\0");
    let entry = key_name_entry(1, b"Software", &[value]);
    let block = data_block(0, &[entry]);

    build_hive(&[root, software], &[block])
}
