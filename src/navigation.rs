//! Key navigation: the twin on-demand decoders over a hive.
//!
//! Two independently addressable lazy stores share one block source: a
//! fixed-stride area over the key hierarchy region and a variable-stride
//! list over the data blocks. Both are backed by bounded caches so a huge
//! hive is never parsed eagerly.

use crate::block_source::BlockSource;
use crate::data_block::{DataBlock, DataBlockHeader, DATA_BLOCK_HEADER_SIZE};
use crate::error::{CregError, Result};
use crate::hierarchy::{
    KeyHierarchyEntry, KeyNavigationHeader, KEY_HIERARCHY_ENTRY_SIZE, KEY_NAVIGATION_HEADER_SIZE,
};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Maximum number of cached key hierarchy entries.
pub const MAX_CACHE_ENTRIES_KEYS: usize = 128;

/// Maximum number of cached decoded data blocks.
pub const MAX_CACHE_ENTRIES_DATA_BLOCKS: usize = 16;

/// A bounded map evicting its least recently used entry when full.
#[derive(Debug)]
struct BoundedCache<K, V> {
    capacity: usize,
    stamp: u64,
    map: HashMap<K, (u64, Arc<V>)>,
}

impl<K: Eq + Hash + Copy, V> BoundedCache<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            stamp: 0,
            map: HashMap::new(),
        }
    }

    fn get(&mut self, key: &K) -> Option<Arc<V>> {
        self.stamp += 1;
        let stamp = self.stamp;

        self.map.get_mut(key).map(|entry| {
            entry.0 = stamp;
            Arc::clone(&entry.1)
        })
    }

    fn insert(&mut self, key: K, value: Arc<V>) {
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            if let Some(oldest) = self
                .map
                .iter()
                .min_by_key(|(_, (stamp, _))| *stamp)
                .map(|(key, _)| *key)
            {
                self.map.remove(&oldest);
            }
        }

        self.stamp += 1;
        self.map.insert(key, (self.stamp, value));
    }
}

/// Lazy, cache-backed access to the key hierarchy area and data block list.
#[derive(Debug)]
pub struct KeyNavigation {
    /// Hive offset of the hierarchy entries region.
    area_offset: u64,

    /// Size of the hierarchy entries region in bytes.
    area_size: u64,

    /// `(offset, size)` of every data block found by the open-time scan.
    data_block_ranges: Vec<(u64, u32)>,

    /// Cache of decoded hierarchy entries, keyed by region-relative offset.
    hierarchy_cache: RwLock<BoundedCache<u32, KeyHierarchyEntry>>,

    /// Cache of decoded data blocks, keyed by list index.
    data_block_cache: RwLock<BoundedCache<usize, DataBlock>>,
}

impl KeyNavigation {
    /// Reads the key navigation area and scans the data block list.
    ///
    /// The list scan appends `(offset, size)` ranges until a header fails
    /// the RGDB check or the end of the hive is reached; a mid-list
    /// signature mismatch stops the scan and reports the hive as corrupted
    /// while exposing everything parsed so far.
    ///
    /// # Arguments
    ///
    /// * `source` - The hive's block source.
    /// * `navigation_offset` - Hive offset of the RGKN header.
    /// * `abort` - Abort flag consulted at every block boundary.
    ///
    /// # Returns
    ///
    /// The navigation and whether corruption was recovered during the scan.
    pub fn read(
        source: &BlockSource,
        navigation_offset: u64,
        abort: &AtomicBool,
    ) -> Result<(Self, bool)> {
        let header_data = source.read(navigation_offset, KEY_NAVIGATION_HEADER_SIZE)?;
        let navigation_header = KeyNavigationHeader::parse(header_data, navigation_offset)?;

        let entries_data_offset = navigation_header.entries_data_offset as u64;

        if entries_data_offset < KEY_NAVIGATION_HEADER_SIZE as u64
            || entries_data_offset > navigation_header.size as u64
        {
            return Err(CregError::format_error(format!(
                "invalid hierarchy entries data offset {:#x}",
                entries_data_offset
            )));
        }

        let area_offset = navigation_offset + entries_data_offset;
        let area_size = navigation_header.size as u64 - entries_data_offset;

        debug!(
            area_offset,
            area_size, "Read key navigation header"
        );

        let mut data_block_ranges = Vec::new();
        let mut corrupted = false;
        let mut file_offset = navigation_offset + navigation_header.size as u64;

        loop {
            if abort.load(Ordering::Relaxed) {
                return Err(CregError::Aborted);
            }

            if file_offset + DATA_BLOCK_HEADER_SIZE as u64 > source.size() {
                break;
            }

            let header_data = source.read(file_offset, DATA_BLOCK_HEADER_SIZE)?;

            let block_header = match DataBlockHeader::parse(header_data, file_offset)? {
                Some(header) => header,
                None => {
                    warn!(
                        offset = file_offset,
                        "Unexpected signature in data block list, stopping scan"
                    );
                    corrupted = true;
                    break;
                }
            };

            if file_offset + block_header.size as u64 > source.size() {
                warn!(
                    offset = file_offset,
                    size = block_header.size,
                    "Data block extends beyond end of hive, stopping scan"
                );
                corrupted = true;
                break;
            }

            data_block_ranges.push((file_offset, block_header.size));
            file_offset += block_header.size as u64;
        }

        debug!(
            data_blocks = data_block_ranges.len(),
            corrupted, "Scanned data block list"
        );

        Ok((
            Self {
                area_offset,
                area_size,
                data_block_ranges,
                hierarchy_cache: RwLock::new(BoundedCache::new(MAX_CACHE_ENTRIES_KEYS)),
                data_block_cache: RwLock::new(BoundedCache::new(MAX_CACHE_ENTRIES_DATA_BLOCKS)),
            },
            corrupted,
        ))
    }

    /// Returns the number of data blocks found by the open-time scan.
    pub fn data_block_count(&self) -> usize {
        self.data_block_ranges.len()
    }

    /// Retrieves the key hierarchy entry at a region-relative offset.
    ///
    /// The lookup maps the offset to a record index by the fixed stride,
    /// so unaligned offsets snap to the record they fall into.
    pub fn hierarchy_entry_at(
        &self,
        source: &BlockSource,
        offset: u32,
    ) -> Result<Arc<KeyHierarchyEntry>> {
        if offset as u64 + KEY_HIERARCHY_ENTRY_SIZE as u64 > self.area_size {
            return Err(CregError::out_of_bounds(
                offset as u64,
                self.area_size,
            ));
        }

        let record_index = offset / KEY_HIERARCHY_ENTRY_SIZE as u32;
        let record_offset = record_index * KEY_HIERARCHY_ENTRY_SIZE as u32;

        if let Some(entry) = self
            .hierarchy_cache
            .write()
            .expect("hierarchy cache lock poisoned")
            .get(&record_offset)
        {
            return Ok(entry);
        }

        let file_offset = self.area_offset + record_offset as u64;
        let data = source.read(file_offset, KEY_HIERARCHY_ENTRY_SIZE)?;
        let entry = Arc::new(KeyHierarchyEntry::parse(data, record_offset)?);

        self.hierarchy_cache
            .write()
            .expect("hierarchy cache lock poisoned")
            .insert(record_offset, Arc::clone(&entry));

        Ok(entry)
    }

    /// Retrieves the decoded data block at a list index.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `index` is not within the scanned list.
    pub fn data_block_at(&self, source: &BlockSource, index: usize) -> Result<Arc<DataBlock>> {
        let (offset, size) = *self
            .data_block_ranges
            .get(index)
            .ok_or_else(|| {
                CregError::out_of_bounds(index as u64, self.data_block_ranges.len() as u64)
            })?;

        if let Some(block) = self
            .data_block_cache
            .write()
            .expect("data block cache lock poisoned")
            .get(&index)
        {
            return Ok(block);
        }

        let header_data = source.read(offset, DATA_BLOCK_HEADER_SIZE)?;
        let header = DataBlockHeader::parse(header_data, offset)?.ok_or_else(|| {
            CregError::invalid_signature(crate::data_block::RGDB_SIGNATURE, &header_data[0..4])
        })?;

        let entries_data = source.read(
            offset + DATA_BLOCK_HEADER_SIZE as u64,
            size as usize - DATA_BLOCK_HEADER_SIZE,
        )?;
        let block = Arc::new(DataBlock::parse_entries(header, entries_data)?);

        self.data_block_cache
            .write()
            .expect("data block cache lock poisoned")
            .insert(index, Arc::clone(&block));

        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_cache_evicts_least_recently_used() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(2);
        cache.insert(1, Arc::new(10));
        cache.insert(2, Arc::new(20));

        // Touch 1 so 2 becomes the eviction candidate.
        assert_eq!(*cache.get(&1).unwrap(), 10);

        cache.insert(3, Arc::new(30));
        assert!(cache.get(&2).is_none());
        assert_eq!(*cache.get(&1).unwrap(), 10);
        assert_eq!(*cache.get(&3).unwrap(), 30);
    }

    #[test]
    fn test_bounded_cache_reinsert_does_not_evict() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(2);
        cache.insert(1, Arc::new(10));
        cache.insert(2, Arc::new(20));
        cache.insert(2, Arc::new(21));

        assert_eq!(*cache.get(&1).unwrap(), 10);
        assert_eq!(*cache.get(&2).unwrap(), 21);
    }
}
