//! Block container
//!
//! Slot storage and the byte image of a single block.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{LinHashError, Result};
use crate::record::fixed::ensure_remaining;
use crate::record::Record;

use super::{BlockHeader, Chained};

/// A fixed-capacity block of records
///
/// Occupied slots always form the prefix `0..valid_count`; removing a record
/// shifts the records after it down by one slot.
#[derive(Debug, Clone)]
pub struct Block<R, H = super::Plain> {
    /// Size of the serialized image (in bytes)
    block_size: usize,
    /// Maximum number of records
    block_factor: usize,
    /// Header fields after the valid count
    header: H,
    /// Occupied slots, in slot order
    records: Vec<R>,
}

impl<R: Record, H: BlockHeader> Block<R, H> {
    /// Create an empty block
    ///
    /// Fails if `block_size` cannot hold the header and at least one record.
    pub fn new(block_size: usize) -> Result<Self> {
        let block_factor = Self::block_factor_for(block_size)?;
        Ok(Self {
            block_size,
            block_factor,
            header: H::default(),
            records: Vec::with_capacity(block_factor),
        })
    }

    /// Records per block for the given block size
    pub fn block_factor_for(block_size: usize) -> Result<usize> {
        let factor = block_size.saturating_sub(H::SIZE) / R::SIZE;
        if factor == 0 {
            return Err(LinHashError::Config(format!(
                "block size {} cannot hold a {}-byte header and one {}-byte record",
                block_size,
                H::SIZE,
                R::SIZE
            )));
        }
        Ok(factor)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_factor(&self) -> usize {
        self.block_factor
    }

    pub fn valid_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() == self.block_factor
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> &H {
        &self.header
    }

    /// Occupied slots in slot order
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Record in the given slot, `None` for an empty slot
    ///
    /// Borrows the slot; the borrow keeps the block from being changed while
    /// it is held. Use [`Block::find`] for an owned copy.
    pub fn record_at(&self, slot: usize) -> Option<&R> {
        self.records.get(slot)
    }

    /// Place a record into the first empty slot
    pub fn add_record(&mut self, record: R) -> Result<()> {
        if self.is_full() {
            return Err(LinHashError::BlockFull);
        }
        self.records.push(record);
        Ok(())
    }

    /// Remove the record with the same key, compacting the slots after it
    pub fn remove_record(&mut self, key: &R) -> Option<R> {
        let slot = self.position(key)?;
        Some(self.records.remove(slot))
    }

    /// Copy of the record with the same key
    pub fn find(&self, key: &R) -> Option<R> {
        self.position(key).map(|slot| self.records[slot].clone())
    }

    /// Overwrite the record with the same key in place
    pub fn update_record(&mut self, record: &R) -> bool {
        match self.position(record) {
            Some(slot) => {
                self.records[slot] = record.clone();
                true
            }
            None => false,
        }
    }

    /// Empty the block, returning the records it held
    pub fn take_records(&mut self) -> Vec<R> {
        std::mem::take(&mut self.records)
    }

    fn position(&self, key: &R) -> Option<usize> {
        self.records.iter().position(|r| r.is_equal(key))
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Encode to exactly `block_size` bytes
    pub fn to_bytes(&self) -> Result<BytesMut> {
        let mut out = BytesMut::with_capacity(self.block_size);

        out.put_i32(self.records.len() as i32);
        self.header.put_extra(&mut out);

        for record in &self.records {
            out.extend_from_slice(&record.to_bytes()?);
        }
        // Empty slots and the tail padding are zero-filled
        out.put_bytes(0, self.block_size - out.len());

        Ok(out)
    }

    /// Decode a block image of exactly `block_size` bytes
    pub fn from_bytes(block_size: usize, buf: &[u8]) -> Result<Self> {
        if buf.len() != block_size {
            return Err(LinHashError::Decode(format!(
                "expected {} block bytes, got {}",
                block_size,
                buf.len()
            )));
        }

        let mut block = Self::new(block_size)?;
        let mut cursor = buf;

        ensure_remaining(cursor, H::SIZE)?;
        let valid_count = cursor.get_i32();
        if valid_count < 0 || valid_count as usize > block.block_factor {
            return Err(LinHashError::Decode(format!(
                "corrupt valid count {} (block factor {})",
                valid_count, block.block_factor
            )));
        }
        block.header = H::get_extra(&mut cursor)?;

        for slot in 0..valid_count as usize {
            let start = H::SIZE + slot * R::SIZE;
            block.records.push(R::decode(&buf[start..start + R::SIZE])?);
        }

        Ok(block)
    }
}

impl<R: Record> Block<R, Chained> {
    /// Index of the next block in the chain, `None` at the end
    pub fn next_block(&self) -> Option<u32> {
        self.header.next
    }

    pub fn set_next_block(&mut self, next: Option<u32>) {
        self.header.next = next;
    }
}
