//! Public hive handles: `CregFile`, `Key` and `Value`.
//!
//! A `CregFile` owns the block source and the navigation caches behind a
//! read/write lock, so concurrent readers are safe and cache mutation is
//! serialised. Keys and values borrow the file and re-validate it on every
//! operation: use after `close` fails with `NotOpen`, and once
//! `signal_abort` is set navigation operations fail with `Aborted`.

use crate::block_source::BlockSource;
use crate::codepage::Codepage;
use crate::error::{CregError, Result};
use crate::header::{FileHeader, FILE_HEADER_SIZE};
use crate::key_item::KeyItem;
use crate::key_tree;
use crate::navigation::KeyNavigation;
use crate::value_entry::{ValueEntry, ValueType};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, info, instrument};

/// Hierarchy record offset of the conventional root key.
pub const ROOT_KEY_OFFSET: u32 = 0;

/// Open-state of a hive: source, header, navigation and mutable settings.
#[derive(Debug)]
struct FileInner {
    source: BlockSource,
    header: FileHeader,
    navigation: KeyNavigation,
    codepage: Codepage,
    corrupted: bool,
}

/// A read-only Windows 9x/Me registry hive.
///
/// The hive is read-only after open. Closing releases the caches and the
/// block source; handles derived from the file detect the close and fail
/// with `NotOpen`.
#[derive(Debug)]
pub struct CregFile {
    inner: RwLock<Option<FileInner>>,
    abort: AtomicBool,
}

impl CregFile {
    /// Opens a hive file.
    ///
    /// Reads the file header, the key navigation area and scans the data
    /// block list.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or mapped
    /// - The header signature is not "CREG"
    /// - The major format version is unsupported
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use creg_parser::CregFile;
    ///
    /// let hive = CregFile::open("USER.DAT").unwrap();
    /// ```
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening CREG hive");
        let source = BlockSource::open(path)?;
        Self::from_source(source)
    }

    /// Opens a hive over owned bytes.
    pub fn open_from_vec(data: Vec<u8>) -> Result<Self> {
        Self::from_source(BlockSource::from_vec(data))
    }

    fn from_source(source: BlockSource) -> Result<Self> {
        let header_data = source.read(0, FILE_HEADER_SIZE)?;
        let header = FileHeader::parse(header_data)?;

        if header.major_version > 1 {
            return Err(CregError::UnsupportedVersion {
                major: header.major_version,
                minor: header.minor_version,
            });
        }

        debug!(
            major = header.major_version,
            minor = header.minor_version,
            navigation_offset = header.navigation_offset,
            "Parsed file header"
        );

        let abort = AtomicBool::new(false);
        let (navigation, corrupted) =
            KeyNavigation::read(&source, header.navigation_offset as u64, &abort)?;

        Ok(Self {
            inner: RwLock::new(Some(FileInner {
                source,
                header,
                navigation,
                codepage: Codepage::default(),
                corrupted,
            })),
            abort,
        })
    }

    /// Closes the hive, releasing the caches and the block source.
    ///
    /// Idempotent: closing an already-closed hive succeeds. Subsequent
    /// operations on the file or on derived handles fail with `NotOpen`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.inner.write().expect("file lock poisoned");
        *guard = None;
        Ok(())
    }

    /// Returns true if the hive is open.
    pub fn is_open(&self) -> bool {
        self.inner
            .read()
            .expect("file lock poisoned")
            .is_some()
    }

    /// Signals long-running operations to stop.
    ///
    /// One-shot and idempotent: once set, navigation operations on this
    /// hive fail with `Aborted`. There is no un-abort.
    pub fn signal_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    fn check_abort(&self) -> Result<()> {
        if self.abort.load(Ordering::Relaxed) {
            return Err(CregError::Aborted);
        }
        Ok(())
    }

    fn with_inner<T>(&self, f: impl FnOnce(&FileInner) -> Result<T>) -> Result<T> {
        let guard = self.inner.read().expect("file lock poisoned");
        match guard.as_ref() {
            Some(inner) => f(inner),
            None => Err(CregError::NotOpen),
        }
    }

    /// Returns the format version as `(major, minor)`.
    pub fn format_version(&self) -> Result<(u16, u16)> {
        self.with_inner(|inner| Ok((inner.header.major_version, inner.header.minor_version)))
    }

    /// Returns true if corruption was recovered while reading the hive.
    pub fn is_corrupted(&self) -> Result<bool> {
        self.with_inner(|inner| Ok(inner.corrupted))
    }

    /// Returns the ASCII codepage used to decode names and string values.
    pub fn ascii_codepage(&self) -> Result<Codepage> {
        self.with_inner(|inner| Ok(inner.codepage))
    }

    /// Sets the ASCII codepage.
    ///
    /// May be changed between reads; it affects the decoding of all
    /// subsequently read names and values.
    pub fn set_ascii_codepage(&self, codepage: Codepage) -> Result<()> {
        let mut guard = self.inner.write().expect("file lock poisoned");
        match guard.as_mut() {
            Some(inner) => {
                inner.codepage = codepage;
                Ok(())
            }
            None => Err(CregError::NotOpen),
        }
    }

    /// Returns the number of data blocks found by the open-time scan.
    pub fn data_block_count(&self) -> Result<usize> {
        self.with_inner(|inner| Ok(inner.navigation.data_block_count()))
    }

    /// Opens the root key.
    #[instrument(skip(self))]
    pub fn root_key(&self) -> Result<Key<'_>> {
        self.key_by_offset(ROOT_KEY_OFFSET)
    }

    /// Opens a key at a hierarchy record offset.
    pub fn key_by_offset(&self, offset: u32) -> Result<Key<'_>> {
        self.check_abort()?;

        let item = self.with_inner(|inner| {
            KeyItem::read(&inner.source, &inner.navigation, &self.abort, offset)
        })?;

        Ok(Key { file: self, item })
    }

    /// Resolves a UTF-8 path from the root key.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when a path segment does not match any child.
    pub fn key_by_utf8_path(&self, path: &str) -> Result<Option<Key<'_>>> {
        self.check_abort()?;

        let offset = self.with_inner(|inner| {
            key_tree::get_key_offset_by_utf8_path(
                &inner.source,
                &inner.navigation,
                &self.abort,
                ROOT_KEY_OFFSET,
                path,
                key_tree::SEPARATOR,
                inner.codepage,
            )
        })?;

        match offset {
            Some(offset) => Ok(Some(self.key_by_offset(offset)?)),
            None => Ok(None),
        }
    }

    /// Resolves a UTF-16 path from the root key.
    pub fn key_by_utf16_path(&self, path: &[u16]) -> Result<Option<Key<'_>>> {
        self.check_abort()?;

        let offset = self.with_inner(|inner| {
            key_tree::get_key_offset_by_utf16_path(
                &inner.source,
                &inner.navigation,
                &self.abort,
                ROOT_KEY_OFFSET,
                path,
                key_tree::SEPARATOR,
                inner.codepage,
            )
        })?;

        match offset {
            Some(offset) => Ok(Some(self.key_by_offset(offset)?)),
            None => Ok(None),
        }
    }
}

/// A key handle: one hierarchy record joined to its name and values.
///
/// Holds the decoded key item by value; navigation back into the hive
/// re-validates the file on every call.
#[derive(Debug)]
pub struct Key<'f> {
    file: &'f CregFile,
    item: KeyItem,
}

impl<'f> Key<'f> {
    /// Returns the hierarchy record offset this key was opened at.
    pub fn offset(&self) -> u32 {
        self.item.offset
    }

    /// Returns the key name size in bytes; 0 for the root.
    pub fn name_size(&self) -> Result<usize> {
        self.file.with_inner(|_| Ok(self.item.name_size()))
    }

    /// Returns the raw key name bytes in the hive codepage.
    pub fn name_bytes(&self) -> Result<&[u8]> {
        self.file.with_inner(|_| Ok(()))?;
        Ok(self.item.name_bytes())
    }

    /// Returns the key name decoded through the hive codepage.
    pub fn utf8_name(&self) -> Result<String> {
        self.file
            .with_inner(|inner| self.item.utf8_name(inner.codepage))
    }

    /// Returns the key name as UTF-16 units.
    pub fn utf16_name(&self) -> Result<Vec<u16>> {
        self.file
            .with_inner(|inner| self.item.utf16_name(inner.codepage))
    }

    /// Returns the number of values.
    pub fn value_count(&self) -> Result<usize> {
        self.file.with_inner(|_| Ok(self.item.value_count()))
    }

    /// Returns the value at an index, in stable on-disk order.
    pub fn value_by_index(&self, index: usize) -> Result<Value<'f>> {
        self.file.with_inner(|_| {
            let entry = self.item.value_at(index).ok_or_else(|| {
                CregError::out_of_bounds(index as u64, self.item.value_count() as u64)
            })?;
            Ok(Value::new(self.file, entry.clone()))
        })
    }

    /// Looks up a value by UTF-8 name.
    ///
    /// The empty name addresses the key's default value.
    pub fn value_by_utf8_name(&self, name: &str) -> Result<Option<Value<'f>>> {
        self.file.with_inner(|inner| {
            Ok(self
                .item
                .value_by_utf8_name(name, inner.codepage)
                .map(|entry| Value::new(self.file, entry.clone())))
        })
    }

    /// Looks up a value by UTF-16 name.
    pub fn value_by_utf16_name(&self, name: &[u16]) -> Result<Option<Value<'f>>> {
        self.file.with_inner(|inner| {
            Ok(self
                .item
                .value_by_utf16_name(name, inner.codepage)
                .map(|entry| Value::new(self.file, entry.clone())))
        })
    }

    /// Returns the number of sub keys.
    pub fn sub_key_count(&self) -> Result<usize> {
        self.file.with_inner(|_| Ok(self.item.number_of_sub_keys()))
    }

    /// Opens the sub key at an index, in sibling chain order.
    pub fn sub_key_by_index(&self, index: usize) -> Result<Key<'f>> {
        let descriptor = self.file.with_inner(|_| {
            self.item.sub_key_descriptor(index).copied().ok_or_else(|| {
                CregError::out_of_bounds(index as u64, self.item.number_of_sub_keys() as u64)
            })
        })?;

        self.file.key_by_offset(descriptor.key_offset)
    }

    /// Opens the sub key matching a UTF-8 name.
    pub fn sub_key_by_utf8_name(&self, name: &str) -> Result<Option<Key<'f>>> {
        self.file.check_abort()?;

        let descriptor = self.file.with_inner(|inner| {
            self.item.sub_key_descriptor_by_utf8_name(
                &inner.source,
                &inner.navigation,
                &self.file.abort,
                name,
                inner.codepage,
            )
        })?;

        match descriptor {
            Some(descriptor) => Ok(Some(self.file.key_by_offset(descriptor.key_offset)?)),
            None => Ok(None),
        }
    }

    /// Opens the sub key matching a UTF-16 name.
    pub fn sub_key_by_utf16_name(&self, name: &[u16]) -> Result<Option<Key<'f>>> {
        let name = crate::codepage::utf16_to_string(name)?;
        self.sub_key_by_utf8_name(&name)
    }

    /// Resolves a UTF-8 path relative to this key.
    pub fn sub_key_by_utf8_path(&self, path: &str) -> Result<Option<Key<'f>>> {
        self.file.check_abort()?;

        let offset = self.file.with_inner(|inner| {
            key_tree::get_key_offset_by_utf8_path(
                &inner.source,
                &inner.navigation,
                &self.file.abort,
                self.item.offset,
                path,
                key_tree::SEPARATOR,
                inner.codepage,
            )
        })?;

        match offset {
            Some(offset) => Ok(Some(self.file.key_by_offset(offset)?)),
            None => Ok(None),
        }
    }

    /// Resolves a UTF-16 path relative to this key.
    pub fn sub_key_by_utf16_path(&self, path: &[u16]) -> Result<Option<Key<'f>>> {
        self.file.check_abort()?;

        let offset = self.file.with_inner(|inner| {
            key_tree::get_key_offset_by_utf16_path(
                &inner.source,
                &inner.navigation,
                &self.file.abort,
                self.item.offset,
                path,
                key_tree::SEPARATOR,
                inner.codepage,
            )
        })?;

        match offset {
            Some(offset) => Ok(Some(self.file.key_by_offset(offset)?)),
            None => Ok(None),
        }
    }

    /// Returns true if a bounded recovery happened while reading this key.
    pub fn is_corrupted(&self) -> bool {
        self.item.is_corrupted()
    }
}

/// A value handle holding a decoded, copied value entry.
pub struct Value<'f> {
    file: &'f CregFile,
    entry: ValueEntry,
    corrupted: bool,
}

impl<'f> Value<'f> {
    fn new(file: &'f CregFile, entry: ValueEntry) -> Self {
        // A typed value whose data size disagrees with its type is
        // recovered by padding/truncation and flagged instead of failing.
        let corrupted = match entry.value_type {
            ValueType::Dword | ValueType::DwordBigEndian => entry.data_size() != 4,
            ValueType::Qword => entry.data_size() != 8,
            _ => false,
        };

        Self {
            file,
            entry,
            corrupted,
        }
    }

    /// Returns the hive offset of the value entry.
    pub fn offset(&self) -> u64 {
        self.entry.offset
    }

    /// Returns the value name size in bytes; 0 for the default value.
    pub fn name_size(&self) -> Result<usize> {
        self.file.with_inner(|_| Ok(self.entry.name_size()))
    }

    /// Returns the raw value name bytes in the hive codepage.
    pub fn name_bytes(&self) -> Result<&[u8]> {
        self.file.with_inner(|_| Ok(()))?;
        Ok(self.entry.name_bytes())
    }

    /// Returns the value name decoded through the hive codepage.
    pub fn utf8_name(&self) -> Result<String> {
        self.file
            .with_inner(|inner| self.entry.utf8_name(inner.codepage))
    }

    /// Returns the value name as UTF-16 units.
    pub fn utf16_name(&self) -> Result<Vec<u16>> {
        self.file
            .with_inner(|inner| self.entry.utf16_name(inner.codepage))
    }

    /// Returns the value data type.
    pub fn value_type(&self) -> Result<ValueType> {
        self.file.with_inner(|_| Ok(self.entry.value_type))
    }

    /// Returns the value data size in bytes.
    pub fn data_size(&self) -> Result<usize> {
        self.file.with_inner(|_| Ok(self.entry.data_size()))
    }

    /// Returns the raw value data bytes.
    pub fn data(&self) -> Result<&[u8]> {
        self.file.with_inner(|_| Ok(()))?;
        Ok(self.entry.data_bytes())
    }

    /// Interprets the data as a 32-bit integer.
    ///
    /// Endianness follows the value type. Short data is zero-padded and
    /// flags the value as corrupted rather than failing.
    pub fn as_u32(&self) -> Result<u32> {
        self.file.with_inner(|_| Ok(self.entry.to_u32().0))
    }

    /// Interprets the data as a 64-bit little-endian integer.
    pub fn as_u64(&self) -> Result<u64> {
        self.file.with_inner(|_| Ok(self.entry.to_u64().0))
    }

    /// Decodes the data as a string through the hive codepage.
    pub fn utf8_string(&self) -> Result<String> {
        self.file
            .with_inner(|inner| self.entry.to_string_data(inner.codepage))
    }

    /// Returns the decoded string size in characters.
    pub fn utf8_string_size(&self) -> Result<usize> {
        Ok(self.utf8_string()?.chars().count())
    }

    /// Decodes the data as a string and re-encodes it as UTF-16 units.
    pub fn utf16_string(&self) -> Result<Vec<u16>> {
        self.file
            .with_inner(|inner| self.entry.to_utf16_string_data(inner.codepage))
    }

    /// Returns the decoded string size in UTF-16 units.
    pub fn utf16_string_size(&self) -> Result<usize> {
        Ok(self.utf16_string()?.len())
    }

    /// Returns the binary data size in bytes.
    pub fn binary_data_size(&self) -> Result<usize> {
        self.data_size()
    }

    /// Returns the data as an opaque byte copy.
    pub fn binary_data(&self) -> Result<Vec<u8>> {
        Ok(self.data()?.to_vec())
    }

    /// Returns true if the on-disk data disagreed with the declared type.
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }
}

#[cfg(test)]
mod tests {
    // End-to-end handle tests live in tests/integration.rs, built on the
    // synthetic hive builder.
}
