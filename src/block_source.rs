//! Random-access byte source backing a hive.
//!
//! All on-disk structures are parsed from borrowed slices handed out by this
//! module. Short reads at end of file are errors, never zero-fills.

use crate::error::{CregError, Result};
use crate::header::FILE_HEADER_SIZE;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Random-access reader over a file or an in-memory range.
#[derive(Debug)]
pub enum BlockSource {
    /// Memory-mapped file data.
    Mapped(Mmap),
    /// Owned data, used by tests and in-memory hives.
    Owned(Vec<u8>),
}

impl BlockSource {
    /// Opens a file-backed source.
    ///
    /// The file size is validated against the minimum hive size before the
    /// mapping is created.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened or mapped, `TruncatedData`
    /// if it is smaller than a file header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;

        let metadata = file.metadata()?;
        let file_size = metadata.len() as usize;

        if file_size < FILE_HEADER_SIZE {
            return Err(CregError::TruncatedData {
                offset: 0,
                expected: FILE_HEADER_SIZE,
                actual: file_size,
            });
        }

        // SAFETY: the file is opened read-only, its size has been validated,
        // the mapping's lifetime is tied to this BlockSource, and all access
        // goes through the bounds-checked read() below.
        let mmap = unsafe { Mmap::map(&file)? };
        debug!(size = mmap.len(), "Memory mapped hive file");

        Ok(BlockSource::Mapped(mmap))
    }

    /// Creates a source over owned bytes.
    pub fn from_vec(data: Vec<u8>) -> Self {
        BlockSource::Owned(data)
    }

    /// Returns the full backing slice.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            BlockSource::Mapped(mmap) => mmap,
            BlockSource::Owned(data) => data,
        }
    }

    /// Returns the total size in bytes.
    pub fn size(&self) -> u64 {
        self.as_slice().len() as u64
    }

    /// Reads `len` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `offset` lies beyond the source,
    /// `TruncatedData` if fewer than `len` bytes remain.
    pub fn read(&self, offset: u64, len: usize) -> Result<&[u8]> {
        let data = self.as_slice();
        let start = offset as usize;

        if offset > data.len() as u64 {
            return Err(CregError::out_of_bounds(offset, data.len() as u64));
        }

        if start + len > data.len() {
            return Err(CregError::TruncatedData {
                offset,
                expected: len,
                actual: data.len() - start,
            });
        }

        Ok(&data[start..start + len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_in_bounds() {
        let source = BlockSource::from_vec(vec![1, 2, 3, 4, 5]);
        assert_eq!(source.read(1, 3).unwrap(), &[2, 3, 4]);
        assert_eq!(source.size(), 5);
    }

    #[test]
    fn test_read_short_is_error() {
        let source = BlockSource::from_vec(vec![1, 2, 3]);
        assert!(matches!(
            source.read(1, 3),
            Err(CregError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_read_past_end_is_error() {
        let source = BlockSource::from_vec(vec![1, 2, 3]);
        assert!(matches!(
            source.read(8, 1),
            Err(CregError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_read_zero_len_at_end() {
        let source = BlockSource::from_vec(vec![1, 2, 3]);
        assert_eq!(source.read(3, 0).unwrap(), &[] as &[u8]);
    }
}
