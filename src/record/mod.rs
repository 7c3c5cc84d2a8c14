//! Record Module
//!
//! The capability set every stored payload implements.
//!
//! ## Responsibilities
//! - Fixed-width binary encode/decode (the width never depends on field contents)
//! - Equality by identity key, not by full contents
//! - Deep copy (`Clone`)
//! - A 64-bit key hash for hashed storage (`Hashable`)
//!
//! Decoding is an associated function, so blocks construct records through the
//! record type itself rather than through any runtime type lookup.

pub mod fixed;
mod pcr;
mod person;

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{LinHashError, Result};

pub use pcr::PcrTest;
pub use person::Person;

/// A payload that can be stored in a block slot
pub trait Record: Clone + fmt::Debug {
    /// Encoded width in bytes
    const SIZE: usize;

    /// Append exactly `SIZE` bytes describing this record
    fn encode<B: BufMut>(&self, out: &mut B);

    /// Build a record from exactly `SIZE` bytes
    fn decode(buf: &[u8]) -> Result<Self>;

    /// Compare identity keys only
    fn is_equal(&self, other: &Self) -> bool;

    /// Encode into a fresh buffer, checking the declared width
    fn to_bytes(&self) -> Result<BytesMut> {
        let mut out = BytesMut::with_capacity(Self::SIZE);
        self.encode(&mut out);
        if out.len() != Self::SIZE {
            return Err(LinHashError::Decode(format!(
                "record encoded to {} bytes, declared size is {}",
                out.len(),
                Self::SIZE
            )));
        }
        Ok(out)
    }
}

/// A record that can be addressed by a linear hash file
pub trait Hashable: Record {
    /// Hash of the identity key
    fn key_hash(&self) -> i64;
}

/// Reject buffers whose length differs from the declared record size
pub(crate) fn check_len<R: Record>(buf: &[u8]) -> Result<()> {
    if buf.len() != R::SIZE {
        return Err(LinHashError::Decode(format!(
            "expected {} record bytes, got {}",
            R::SIZE,
            buf.len()
        )));
    }
    Ok(())
}
