//! Key tree path resolution.
//!
//! Splits a path on a caller-declared separator and descends child by child
//! from a root hierarchy record, comparing segment names codepage- and
//! case-aware with the streaming name hash as a fast reject.

use crate::block_source::BlockSource;
use crate::codepage::Codepage;
use crate::error::{CregError, Result};
use crate::key_item::{KeyItem, MAX_SUB_KEY_RECURSION_DEPTH};
use crate::navigation::KeyNavigation;
use std::sync::atomic::AtomicBool;

/// Default path separator.
pub const SEPARATOR: char = '\\';

/// Resolves a UTF-8 path to a hierarchy record offset.
///
/// A single leading separator is stripped; an empty remainder resolves to
/// the root itself. Empty segments (`A\\B`) short-circuit to "not found".
///
/// # Arguments
///
/// * `root_offset` - Hierarchy record offset to start from.
/// * `path` - The path string.
/// * `separator` - Separator character; any ASCII code point.
///
/// # Returns
///
/// The offset of the resolved key, or `None` when a segment does not match
/// any child.
///
/// # Errors
///
/// Returns `LimitExceeded` when the path has more segments than the
/// recursion bound allows.
pub fn get_key_offset_by_utf8_path(
    source: &BlockSource,
    navigation: &KeyNavigation,
    abort: &AtomicBool,
    root_offset: u32,
    path: &str,
    separator: char,
    codepage: Codepage,
) -> Result<Option<u32>> {
    let path = path.strip_prefix(separator).unwrap_or(path);

    if path.is_empty() {
        return Ok(Some(root_offset));
    }

    let mut key_offset = root_offset;

    for (segment_index, segment) in path.split(separator).enumerate() {
        if segment_index >= MAX_SUB_KEY_RECURSION_DEPTH {
            return Err(CregError::LimitExceeded {
                what: "path segment depth",
                limit: MAX_SUB_KEY_RECURSION_DEPTH,
            });
        }

        if segment.is_empty() {
            return Ok(None);
        }

        let key_item = KeyItem::read(source, navigation, abort, key_offset)?;

        match key_item.sub_key_descriptor_by_utf8_name(
            source, navigation, abort, segment, codepage,
        )? {
            Some(descriptor) => key_offset = descriptor.key_offset,
            None => return Ok(None),
        }
    }

    Ok(Some(key_offset))
}

/// Resolves a UTF-16 path to a hierarchy record offset.
pub fn get_key_offset_by_utf16_path(
    source: &BlockSource,
    navigation: &KeyNavigation,
    abort: &AtomicBool,
    root_offset: u32,
    path: &[u16],
    separator: char,
    codepage: Codepage,
) -> Result<Option<u32>> {
    let path = crate::codepage::utf16_to_string(path)?;
    get_key_offset_by_utf8_path(
        source,
        navigation,
        abort,
        root_offset,
        &path,
        separator,
        codepage,
    )
}
