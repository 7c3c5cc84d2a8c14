//! Fixed-width field encoding
//!
//! Numeric fields are big-endian. Booleans take one byte. Strings are written as
//! an `i32` length prefix followed by `max_chars` UTF-16 code units, padded with
//! NUL characters; the prefix truncates the string again on read.
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────────┐
//! │ Len: i32   │ max_chars × u16 (NUL padded)              │
//! └────────────┴──────────────────────────────────────────┘
//! ```

use bytes::{Buf, BufMut};

use crate::error::{LinHashError, Result};

/// Encoded size of a fixed string field with room for `max_chars` characters
pub const fn fixed_string_size(max_chars: usize) -> usize {
    4 + 2 * max_chars
}

/// Write a string as a length-prefixed, NUL-padded UTF-16 field
pub fn put_fixed_string<B: BufMut>(out: &mut B, value: &str, max_chars: usize) {
    let units: Vec<u16> = value.encode_utf16().take(max_chars).collect();
    out.put_i32(units.len() as i32);
    for unit in &units {
        out.put_u16(*unit);
    }
    for _ in units.len()..max_chars {
        out.put_u16(0);
    }
}

/// The string [`get_fixed_string`] returns after writing `value`
///
/// Identity keys held in fixed string fields are cut with this on
/// construction, so the in-memory key matches the stored one.
pub fn truncate_units(value: &str, max_chars: usize) -> String {
    let units: Vec<u16> = value.encode_utf16().take(max_chars).collect();
    String::from_utf16_lossy(&units)
}

/// Read a field written by [`put_fixed_string`]
pub fn get_fixed_string(buf: &mut &[u8], max_chars: usize) -> Result<String> {
    ensure_remaining(buf, fixed_string_size(max_chars))?;

    let len = buf.get_i32();
    if len < 0 || len as usize > max_chars {
        return Err(LinHashError::Decode(format!(
            "string length {} outside 0..={}",
            len, max_chars
        )));
    }

    let units: Vec<u16> = (0..max_chars).map(|_| buf.get_u16()).collect();
    Ok(String::from_utf16_lossy(&units[..len as usize]))
}

pub fn put_bool<B: BufMut>(out: &mut B, value: bool) {
    out.put_u8(u8::from(value));
}

pub fn get_bool(buf: &mut &[u8]) -> Result<bool> {
    ensure_remaining(buf, 1)?;
    Ok(buf.get_u8() != 0)
}

/// Fail with a decode error instead of letting `Buf` panic on a short read
pub fn ensure_remaining(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(LinHashError::Decode(format!(
            "need {} more bytes, {} left",
            needed,
            buf.len()
        )));
    }
    Ok(())
}
