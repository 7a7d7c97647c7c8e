//! Error types for CREG parsing operations.
//!
//! This module provides comprehensive error handling for all hive parsing
//! operations, including I/O errors, format violations, and data corruption.

use std::io;
use thiserror::Error;

/// Result type alias for CREG operations.
pub type Result<T> = std::result::Result<T, CregError>;

/// Errors that can occur while parsing a CREG hive.
#[derive(Error, Debug)]
pub enum CregError {
    /// I/O error occurred while reading the hive file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic signature in the file header or a navigation structure.
    #[error("Invalid signature: expected {expected:?}, found {found:?}")]
    InvalidSignature {
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    /// Invalid hive format or corrupted data.
    #[error("Invalid hive format: {0}")]
    InvalidFormat(String),

    /// An offset points outside the hive.
    #[error("Offset out of bounds: {offset:#x} (hive size: {hive_size:#x})")]
    OutOfBounds {
        offset: u64,
        hive_size: u64,
    },

    /// Data truncated or incomplete.
    #[error("Truncated data at offset {offset:#x}: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// Unsupported hive format version.
    #[error("Unsupported hive version: {major}.{minor}")]
    UnsupportedVersion {
        major: u16,
        minor: u16,
    },

    /// Codepage is not in the accepted set.
    #[error("Unsupported codepage: {0}")]
    UnsupportedCodepage(u16),

    /// Invalid byte sequence for the chosen codepage or query encoding.
    #[error("Conversion error at offset {offset:#x}: {reason}")]
    Conversion {
        offset: u64,
        reason: &'static str,
    },

    /// Recursion depth or another structural bound was exceeded.
    #[error("Limit exceeded: {what} is bounded to {limit}")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
    },

    /// A sibling offset revisits an already-walked hierarchy range.
    #[error("Corrupted sibling cycle at hierarchy offset {offset:#x}")]
    CorruptedCycle {
        offset: u32,
    },

    /// Key or value not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation on a closed hive or a handle derived from one.
    #[error("File not open")]
    NotOpen,

    /// `signal_abort` was observed mid-operation.
    #[error("Operation aborted")]
    Aborted,
}

impl CregError {
    /// Creates an invalid signature error with context.
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected signature bytes
    /// * `found` - Actual signature bytes found
    pub fn invalid_signature(expected: &[u8], found: &[u8]) -> Self {
        Self::InvalidSignature {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }

    /// Creates an out-of-bounds error with context.
    ///
    /// # Arguments
    ///
    /// * `offset` - The offending offset
    /// * `hive_size` - Total size of the hive for context
    pub fn out_of_bounds(offset: u64, hive_size: u64) -> Self {
        Self::OutOfBounds { offset, hive_size }
    }

    /// Creates a format error with detailed context.
    ///
    /// # Arguments
    ///
    /// * `message` - Description of the format error
    pub fn format_error(message: String) -> Self {
        Self::InvalidFormat(message)
    }

    /// Creates a not found error with context about what was being searched.
    ///
    /// # Arguments
    ///
    /// * `item_type` - Type of item (e.g., "key", "value")
    /// * `name` - Name of the item that wasn't found
    pub fn not_found(item_type: &str, name: &str) -> Self {
        Self::NotFound(format!("{} '{}'", item_type, name))
    }
}
