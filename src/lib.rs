//! # Windows 9x/Me Registry (CREG) Hive Parser
//!
//! A read-only parser for the CREG binary on-disk format, the per-user
//! `USER.DAT` / per-machine `SYSTEM.DAT` registry hive used by Windows 95,
//! 98 and Me.
//!
//! ## Features
//!
//! - **Fast parsing**: memory-mapped I/O and demand-driven, cache-backed
//!   decoding; a huge hive is never parsed eagerly
//! - **Codepage aware**: names and string values decode through the hive's
//!   ASCII codepage (default Windows-1252), changeable between reads
//! - **Corruption tolerant**: truncated typed values and a broken data
//!   block list are recovered and flagged instead of failing; sibling
//!   cycles and runaway depths are detected and rejected
//! - **Comprehensive error handling**: detailed error types for debugging
//!
//! ## Architecture
//!
//! Two coupled structures form the hive:
//!
//! 1. **File header**: the `CREG` signature, format version and the offset
//!    of the key navigation area
//! 2. **Key navigation (RGKN)**: a flat area of fixed-size hierarchy
//!    records forming parent/sibling/child links
//! 3. **Data blocks (RGDB)**: a linear list of variable-sized blocks, each
//!    carrying key name entries with their packed value entries
//!
//! A key joins the two halves: its hierarchy record locates the key name
//! entry by `(data_block_number, key_name_entry_index)`.
//!
//! ## Binary Layout
//!
//! ```text
//! [File Header - 32 bytes]
//!   - Signature: "CREG"
//!   - Version, key navigation offset
//!
//! [Key Navigation - variable size]
//!   [RGKN Header - 32 bytes]
//!   [Hierarchy Records - 28 bytes each]
//!     - Name hash, parent/child/sibling offsets
//!     - (data block number, key name entry index)
//!
//! [Data Blocks - variable size, linear list]
//!   [RGDB Header - 32 bytes]
//!   [Key Name Entries - variable size]
//!     - Name, value count
//!     [Value Entries - variable size]
//!       - Type, name, data
//! ```
//!
//! ## Examples
//!
//! ### Basic Usage
//!
//! ```no_run
//! use creg_parser::CregFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open a registry hive
//! let hive = CregFile::open("USER.DAT")?;
//!
//! // Get the root key
//! let root = hive.root_key()?;
//!
//! // Enumerate sub keys
//! for index in 0..root.sub_key_count()? {
//!     let sub_key = root.sub_key_by_index(index)?;
//!     println!("  Key: {}", sub_key.utf8_name()?);
//! }
//!
//! // Enumerate values
//! for index in 0..root.value_count()? {
//!     let value = root.value_by_index(index)?;
//!     println!("  Value: {}", value.utf8_name()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Accessing Specific Values
//!
//! ```no_run
//! use creg_parser::CregFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hive = CregFile::open("SYSTEM.DAT")?;
//!
//! let key = hive
//!     .key_by_utf8_path("Software\\Microsoft\\Windows\\CurrentVersion")?
//!     .ok_or("key not found")?;
//!
//! if let Some(value) = key.value_by_utf8_name("ProductName")? {
//!     println!("ProductName = {}", value.utf8_string()?);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block_source;
pub mod codepage;
pub mod data_block;
pub mod error;
pub mod file;
pub mod header;
pub mod hierarchy;
pub mod key_item;
pub mod key_name_entry;
pub mod key_tree;
pub mod navigation;
pub mod utils;
pub mod value_entry;

// Re-export main types for convenience
pub use block_source::BlockSource;
pub use codepage::Codepage;
pub use data_block::{DataBlock, DataBlockHeader};
pub use error::{CregError, Result};
pub use file::{CregFile, Key, Value, ROOT_KEY_OFFSET};
pub use header::FileHeader;
pub use hierarchy::{KeyHierarchyEntry, KeyNavigationHeader};
pub use key_item::{KeyDescriptor, KeyItem, MAX_SUB_KEY_RECURSION_DEPTH};
pub use key_name_entry::KeyNameEntry;
pub use navigation::{KeyNavigation, MAX_CACHE_ENTRIES_DATA_BLOCKS, MAX_CACHE_ENTRIES_KEYS};
pub use value_entry::{ValueEntry, ValueType};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
