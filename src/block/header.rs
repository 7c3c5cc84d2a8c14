//! Block header variants
//!
//! Every header starts with the valid count; the variants differ only in what
//! follows it.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::{LinHashError, Result};
use crate::record::fixed::ensure_remaining;

use super::{END_OF_CHAIN, VALID_COUNT_SIZE};

/// Header fields stored after the valid count
pub trait BlockHeader: Clone + Default + fmt::Debug {
    /// Total header size, valid count included
    const SIZE: usize;

    fn put_extra<B: BufMut>(&self, out: &mut B);

    fn get_extra(buf: &mut &[u8]) -> Result<Self>;
}

/// Header of a plain block: the valid count only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plain;

impl BlockHeader for Plain {
    const SIZE: usize = VALID_COUNT_SIZE;

    fn put_extra<B: BufMut>(&self, _out: &mut B) {}

    fn get_extra(_buf: &mut &[u8]) -> Result<Self> {
        Ok(Plain)
    }
}

/// Header of a chained block: valid count plus the next block index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chained {
    pub(super) next: Option<u32>,
}

impl BlockHeader for Chained {
    const SIZE: usize = VALID_COUNT_SIZE + 4;

    fn put_extra<B: BufMut>(&self, out: &mut B) {
        out.put_i32(self.next.map_or(END_OF_CHAIN, |index| index as i32));
    }

    fn get_extra(buf: &mut &[u8]) -> Result<Self> {
        ensure_remaining(buf, 4)?;
        let next = match buf.get_i32() {
            END_OF_CHAIN => None,
            index if index >= 0 => Some(index as u32),
            index => {
                return Err(LinHashError::Decode(format!(
                    "corrupt next block index {}",
                    index
                )))
            }
        };
        Ok(Self { next })
    }
}
