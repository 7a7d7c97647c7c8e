//! Key items: where the hierarchy area and the data blocks meet.
//!
//! A key item resolves one hierarchy record to its key name entry (absent
//! for the synthetic root) and walks the sibling chain of its children into
//! a list of descriptors. The sibling walk is depth-bounded and guarded
//! against cycles by an interval set over already-visited record ranges.

use crate::block_source::BlockSource;
use crate::codepage::Codepage;
use crate::error::{CregError, Result};
use crate::hierarchy::{is_end_offset, KEY_HIERARCHY_ENTRY_SIZE};
use crate::key_name_entry::KeyNameEntry;
use crate::navigation::KeyNavigation;
use crate::utils::name_hash;
use crate::value_entry::ValueEntry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Bound on every navigation loop: sibling walks, path descents and nested
/// key item opens.
pub const MAX_SUB_KEY_RECURSION_DEPTH: usize = 512;

/// Describes one sub key by the offset of its hierarchy record.
#[derive(Debug, Clone, Copy)]
pub struct KeyDescriptor {
    /// Hierarchy record offset, relative to the entries region.
    pub key_offset: u32,
}

/// An interval set over walked hierarchy record ranges.
///
/// Keyed by range start; insertion fails when the new range overlaps an
/// existing one, which is how sibling cycles are detected.
struct RangeList {
    ranges: BTreeMap<u32, u32>,
}

impl RangeList {
    fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Inserts `[start, start + len)`. Returns false on overlap.
    fn insert(&mut self, start: u32, len: u32) -> bool {
        let end = start.saturating_add(len);

        if let Some((_, &prev_end)) = self.ranges.range(..=start).next_back() {
            if prev_end > start {
                return false;
            }
        }

        if let Some((&next_start, _)) = self.ranges.range(start..).next() {
            if next_start < end {
                return false;
            }
        }

        self.ranges.insert(start, end);
        true
    }
}

/// One opened key: its name entry (if any) and its child descriptors.
#[derive(Debug, Clone)]
pub struct KeyItem {
    /// Hierarchy record offset this item was opened at.
    pub offset: u32,

    /// On-disk name hash from the hierarchy record.
    pub name_hash: u32,

    /// The associated key name entry; absent for the synthetic root.
    key_name_entry: Option<KeyNameEntry>,

    /// Child descriptors in sibling chain order.
    sub_key_descriptors: Vec<KeyDescriptor>,

    /// Set when a bounded recovery happened while reading this key.
    corrupted: bool,
}

impl KeyItem {
    /// Opens the key item at a hierarchy record offset.
    ///
    /// Resolves the record's `(data_block_number, key_name_entry_index)`
    /// locator when present and walks the sibling chain of its children.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` when the sibling chain exceeds the recursion
    /// bound, `CorruptedCycle` when it revisits a walked record range, and
    /// `OutOfBounds`/`InvalidFormat` when the locator does not resolve.
    pub fn read(
        source: &BlockSource,
        navigation: &KeyNavigation,
        abort: &AtomicBool,
        offset: u32,
    ) -> Result<Self> {
        let hierarchy_entry = navigation.hierarchy_entry_at(source, offset)?;
        let mut corrupted = false;

        let key_name_entry = if hierarchy_entry.has_key_name_entry() {
            let block_number = hierarchy_entry.data_block_number as usize;

            if block_number >= navigation.data_block_count() {
                return Err(CregError::out_of_bounds(
                    block_number as u64,
                    navigation.data_block_count() as u64,
                ));
            }

            let data_block = navigation.data_block_at(source, block_number)?;

            let entry = data_block
                .entry_by_identifier(hierarchy_entry.key_name_entry_index)
                .ok_or_else(|| {
                    CregError::format_error(format!(
                        "missing key name entry {} in data block {}",
                        hierarchy_entry.key_name_entry_index, block_number
                    ))
                })?;

            if entry.values_truncated() {
                corrupted = true;
            }

            Some(entry.clone())
        } else {
            None
        };

        let mut sub_key_descriptors = Vec::new();
        let mut walked_ranges = RangeList::new();
        let mut sub_key_offset = hierarchy_entry.first_child_offset;
        let mut recursion_depth = 0usize;

        while !is_end_offset(sub_key_offset) {
            if abort.load(Ordering::Relaxed) {
                return Err(CregError::Aborted);
            }

            if recursion_depth > MAX_SUB_KEY_RECURSION_DEPTH {
                return Err(CregError::LimitExceeded {
                    what: "sub key recursion depth",
                    limit: MAX_SUB_KEY_RECURSION_DEPTH,
                });
            }

            if !walked_ranges.insert(sub_key_offset, KEY_HIERARCHY_ENTRY_SIZE as u32) {
                return Err(CregError::CorruptedCycle {
                    offset: sub_key_offset,
                });
            }

            let sub_key_entry = navigation.hierarchy_entry_at(source, sub_key_offset)?;

            sub_key_descriptors.push(KeyDescriptor {
                key_offset: sub_key_offset,
            });

            sub_key_offset = sub_key_entry.next_sibling_offset;
            recursion_depth += 1;
        }

        debug!(
            offset,
            sub_keys = sub_key_descriptors.len(),
            "Read key item"
        );

        Ok(KeyItem {
            offset,
            name_hash: hierarchy_entry.name_hash,
            key_name_entry,
            sub_key_descriptors,
            corrupted,
        })
    }

    /// Returns the name size in bytes; 0 for the synthetic root.
    pub fn name_size(&self) -> usize {
        self.key_name_entry
            .as_ref()
            .map_or(0, KeyNameEntry::name_size)
    }

    /// Returns the raw name bytes; empty for the synthetic root.
    pub fn name_bytes(&self) -> &[u8] {
        self.key_name_entry
            .as_ref()
            .map_or(&[], KeyNameEntry::name_bytes)
    }

    /// Decodes the name through the hive codepage.
    pub fn utf8_name(&self, codepage: Codepage) -> Result<String> {
        match &self.key_name_entry {
            Some(entry) => entry.utf8_name(codepage),
            None => Ok(String::new()),
        }
    }

    /// Decodes the name through the hive codepage as UTF-16 units.
    pub fn utf16_name(&self, codepage: Codepage) -> Result<Vec<u16>> {
        match &self.key_name_entry {
            Some(entry) => entry.utf16_name(codepage),
            None => Ok(Vec::new()),
        }
    }

    /// Compares this key's name to a UTF-8 query, case-insensitively.
    pub fn compare_name_with_utf8(
        &self,
        query: &str,
        codepage: Codepage,
        query_hash: u32,
    ) -> bool {
        match &self.key_name_entry {
            Some(entry) => entry.compare_name_with_utf8(query, codepage, query_hash),
            None => query.is_empty(),
        }
    }

    /// Returns the number of values.
    pub fn value_count(&self) -> usize {
        self.key_name_entry
            .as_ref()
            .map_or(0, KeyNameEntry::value_count)
    }

    /// Returns the value entry at an index, in stable on-disk order.
    pub fn value_at(&self, index: usize) -> Option<&ValueEntry> {
        self.key_name_entry
            .as_ref()
            .and_then(|entry| entry.value_at(index))
    }

    /// Looks up a value entry by UTF-8 name.
    ///
    /// The query is hashed once; entries whose stored hash is nonzero and
    /// differs are skipped without decoding.
    pub fn value_by_utf8_name(&self, query: &str, codepage: Codepage) -> Option<&ValueEntry> {
        let entry = self.key_name_entry.as_ref()?;
        let query_hash = name_hash(query.chars());

        entry
            .values()
            .iter()
            .find(|value| value.compare_name_with_utf8(query, codepage, query_hash))
    }

    /// Looks up a value entry by UTF-16 name.
    pub fn value_by_utf16_name(&self, query: &[u16], codepage: Codepage) -> Option<&ValueEntry> {
        let query = crate::codepage::utf16_to_string(query).ok()?;
        self.value_by_utf8_name(&query, codepage)
    }

    /// Returns the number of sub keys.
    pub fn number_of_sub_keys(&self) -> usize {
        self.sub_key_descriptors.len()
    }

    /// Returns the sub key descriptor at an index, in sibling chain order.
    pub fn sub_key_descriptor(&self, index: usize) -> Option<&KeyDescriptor> {
        self.sub_key_descriptors.get(index)
    }

    /// Finds the sub key whose name matches a UTF-8 query.
    ///
    /// Linear scan over the descriptors: the stored hierarchy hash rejects
    /// most mismatches before the sub key item is opened for a full
    /// compare. Sibling counts in CREG hives are small, so O(n) is fine.
    pub fn sub_key_descriptor_by_utf8_name(
        &self,
        source: &BlockSource,
        navigation: &KeyNavigation,
        abort: &AtomicBool,
        query: &str,
        codepage: Codepage,
    ) -> Result<Option<KeyDescriptor>> {
        let query_hash = name_hash(query.chars());

        for descriptor in &self.sub_key_descriptors {
            if abort.load(Ordering::Relaxed) {
                return Err(CregError::Aborted);
            }

            let hierarchy_entry =
                navigation.hierarchy_entry_at(source, descriptor.key_offset)?;

            if query_hash != 0
                && hierarchy_entry.name_hash != 0
                && query_hash != hierarchy_entry.name_hash
            {
                continue;
            }

            let sub_key_item = KeyItem::read(source, navigation, abort, descriptor.key_offset)?;

            if sub_key_item.compare_name_with_utf8(query, codepage, query_hash) {
                return Ok(Some(*descriptor));
            }
        }

        Ok(None)
    }

    /// Finds the sub key whose name matches a UTF-16 query.
    pub fn sub_key_descriptor_by_utf16_name(
        &self,
        source: &BlockSource,
        navigation: &KeyNavigation,
        abort: &AtomicBool,
        query: &[u16],
        codepage: Codepage,
    ) -> Result<Option<KeyDescriptor>> {
        let query = crate::codepage::utf16_to_string(query)?;
        self.sub_key_descriptor_by_utf8_name(source, navigation, abort, &query, codepage)
    }

    /// Returns true if a bounded recovery happened while reading this key.
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }
}
