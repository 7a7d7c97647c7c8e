//! Utility functions for binary parsing and name hashing.

use crate::error::{CregError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Reads a u32 from a byte slice at the given offset.
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return Err(CregError::TruncatedData {
            offset: offset as u64,
            expected: 4,
            actual: data.len().saturating_sub(offset),
        });
    }

    let mut cursor = Cursor::new(&data[offset..offset + 4]);
    Ok(cursor.read_u32::<LittleEndian>()?)
}

/// Reads a u16 from a byte slice at the given offset.
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(CregError::TruncatedData {
            offset: offset as u64,
            expected: 2,
            actual: data.len().saturating_sub(offset),
        });
    }

    let mut cursor = Cursor::new(&data[offset..offset + 2]);
    Ok(cursor.read_u16::<LittleEndian>()?)
}

/// Uppercases a single character the way the registry compares names.
///
/// Mappings that expand to multiple characters (e.g. U+00DF) are left
/// unchanged, keeping the fold one-to-one.
#[inline]
pub fn fold_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Computes the registry name hash over a sequence of characters.
///
/// `h = h * 37 + fold_upper(c)` with unsigned 32-bit wrap. The same formula
/// covers key names, value names and query strings; a result of 0 is treated
/// by callers as "no hash" and forces a full compare.
pub fn name_hash<I>(chars: I) -> u32
where
    I: IntoIterator<Item = char>,
{
    let mut hash: u32 = 0;

    for c in chars {
        hash = hash.wrapping_mul(37).wrapping_add(fold_upper(c) as u32);
    }

    hash
}

/// Compares two character sequences case-insensitively.
///
/// Both iterators must end together for the names to match.
pub fn names_equal<A, B>(a: A, b: B) -> bool
where
    A: IntoIterator<Item = char>,
    B: IntoIterator<Item = char>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();

    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                if fold_upper(x) != fold_upper(y) {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
