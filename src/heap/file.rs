//! Heap File
//!
//! A file of fixed-size blocks addressed by index.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::block::{Block, BlockHeader, Chained, ChainedBlock, Plain};
use crate::error::{LinHashError, Result};
use crate::record::Record;

use super::metadata::HeapMetadata;

/// Result of inserting into a specific block
#[derive(Debug)]
pub enum InsertOutcome<R, H> {
    /// The record was stored; `block` is the block as written
    Inserted { index: u32, block: Block<R, H> },

    /// The block had no free slot; the record is handed back untouched
    Full {
        index: u32,
        block: Block<R, H>,
        record: R,
    },
}

/// How a deletion changed the start of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainHead {
    /// The chain still starts at the same block
    Unchanged,

    /// The starting block was emptied and unlinked; the chain now starts here
    Replaced(Option<u32>),
}

/// Block-addressable file with free-space bookkeeping
///
/// ## Free lists
/// - `empty`: blocks with no records
/// - `partial`: blocks with some, but not all, slots used
///
/// Both are ordered sets; the lowest index is reused first.
pub struct HeapFile<R, H = Plain> {
    /// Path of the data file
    data_path: PathBuf,

    /// Size of every block (in bytes)
    block_size: usize,

    /// Records per block
    block_factor: usize,

    /// Counts and free lists (persisted in sidecars)
    meta: HeapMetadata,

    _marker: PhantomData<fn() -> (R, H)>,
}

impl<R: Record, H: BlockHeader> HeapFile<R, H> {
    /// Open or create a heap file
    ///
    /// If the data file exists its counts and free lists are reloaded from the
    /// sidecars; otherwise an empty data file is created and the sidecars are
    /// written.
    pub fn open(path: impl AsRef<Path>, block_size: usize) -> Result<Self> {
        let data_path = path.as_ref().to_path_buf();
        let block_factor = Block::<R, H>::block_factor_for(block_size)?;
        let mut meta = HeapMetadata::new(&data_path);

        if data_path.exists() {
            meta.load()?;

            let expected = u64::from(meta.total_blocks) * block_size as u64;
            let actual = fs::metadata(&data_path)?.len();
            if actual < expected {
                return Err(LinHashError::Metadata(format!(
                    "{} holds {} bytes, header expects {} blocks of {} bytes",
                    data_path.display(),
                    actual,
                    meta.total_blocks,
                    block_size
                )));
            }

            tracing::debug!(
                "Opened heap file {}: {} blocks, {} records",
                data_path.display(),
                meta.total_blocks,
                meta.total_records
            );
        } else {
            if let Some(parent) = data_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            File::create(&data_path)?;
            meta.save()?;

            tracing::debug!("Created heap file {}", data_path.display());
        }

        Ok(Self {
            data_path,
            block_size,
            block_factor,
            meta,
            _marker: PhantomData,
        })
    }

    // =========================================================================
    // Block I/O
    // =========================================================================

    /// Read and decode the block at `index`
    pub fn get_block(&self, index: u32) -> Result<Block<R, H>> {
        self.check_index(index)?;

        let mut file = File::open(&self.data_path)?;
        file.seek(SeekFrom::Start(self.offset(index)))?;

        let mut buf = vec![0u8; self.block_size];
        file.read_exact(&mut buf)?;

        Block::from_bytes(self.block_size, &buf)
    }

    /// Encode and overwrite the existing block at `index`
    ///
    /// Free lists and counts are left untouched. New blocks are only added
    /// through the insert and allocate operations.
    pub fn write_block(&self, block: &Block<R, H>, index: u32) -> Result<()> {
        self.check_index(index)?;
        self.write_at(block, index)
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Insert a record wherever there is room
    ///
    /// Destination priority: a partially-full block, then an empty block, then
    /// a new block appended at the end. Returns the block index used.
    pub fn insert_record(&mut self, record: R) -> Result<u32> {
        let index = self
            .meta
            .partial
            .first()
            .or_else(|| self.meta.empty.first())
            .copied()
            .unwrap_or(self.meta.total_blocks);

        let mut block = if index < self.meta.total_blocks {
            self.get_block(index)?
        } else {
            Block::new(self.block_size)?
        };
        block.add_record(record)?;

        self.store(index, &block)?;
        self.meta.total_records += 1;
        self.meta.save()?;

        Ok(index)
    }

    /// Insert a record into the block at `index`
    ///
    /// A full block yields `InsertOutcome::Full` with the record handed back;
    /// continuing elsewhere is the caller's job. An index past the end
    /// inserts into a new block instead.
    pub fn insert_record_at(&mut self, record: R, index: u32) -> Result<InsertOutcome<R, H>> {
        if index >= self.meta.total_blocks {
            let (index, block) = self.insert_record_as_new_block(record)?;
            return Ok(InsertOutcome::Inserted { index, block });
        }

        let mut block = self.get_block(index)?;
        if block.is_full() {
            return Ok(InsertOutcome::Full {
                index,
                block,
                record,
            });
        }
        block.add_record(record)?;

        self.store(index, &block)?;
        self.meta.total_records += 1;
        self.meta.save()?;

        Ok(InsertOutcome::Inserted { index, block })
    }

    /// Insert a record as the only record of a fresh block
    ///
    /// Reuses an empty block if there is one, otherwise appends. Partially
    /// full blocks are never used.
    pub fn insert_record_as_new_block(&mut self, record: R) -> Result<(u32, Block<R, H>)> {
        let index = self
            .meta
            .empty
            .first()
            .copied()
            .unwrap_or(self.meta.total_blocks);

        let mut block = Block::new(self.block_size)?;
        block.add_record(record)?;

        self.store(index, &block)?;
        self.meta.total_records += 1;
        self.meta.save()?;

        Ok((index, block))
    }

    /// Copy of the record with the same key in block `index`
    pub fn find_record(&self, index: u32, key: &R) -> Result<Option<R>> {
        if index >= self.meta.total_blocks {
            return Ok(None);
        }
        Ok(self.get_block(index)?.find(key))
    }

    /// Delete a record from block `index`, then trim trailing empty blocks
    pub fn delete_record(&mut self, index: u32, key: &R) -> Result<Option<R>> {
        let removed = self.remove_record(index, key)?;
        if removed.is_some() {
            self.trim_trailing_empty_blocks()?;
        }
        Ok(removed)
    }

    /// Delete a record from block `index` without trimming
    ///
    /// Used for blocks that must keep their position even when empty.
    pub fn remove_record(&mut self, index: u32, key: &R) -> Result<Option<R>> {
        if index >= self.meta.total_blocks {
            return Ok(None);
        }

        let mut block = self.get_block(index)?;
        let Some(removed) = block.remove_record(key) else {
            return Ok(None);
        };

        self.store(index, &block)?;
        self.meta.total_records -= 1;
        self.meta.save()?;

        Ok(Some(removed))
    }

    /// Overwrite the record with the same key in block `index`
    pub fn replace_record(&mut self, index: u32, record: &R) -> Result<bool> {
        if index >= self.meta.total_blocks {
            return Ok(false);
        }

        let mut block = self.get_block(index)?;
        if !block.update_record(record) {
            return Ok(false);
        }
        self.write_block(&block, index)?;

        Ok(true)
    }

    /// Reset block `index` to an empty block, returning what it held
    ///
    /// The returned block still carries its records and header.
    pub fn take_block(&mut self, index: u32) -> Result<Block<R, H>> {
        let old = self.get_block(index)?;

        self.store(index, &Block::new(self.block_size)?)?;
        self.meta.total_records -= old.valid_count() as u64;
        self.meta.save()?;

        Ok(old)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Append one empty block, returning its index
    pub fn allocate_empty_block(&mut self) -> Result<u32> {
        let index = self.meta.total_blocks;

        self.store(index, &Block::new(self.block_size)?)?;
        self.meta.save()?;

        Ok(index)
    }

    /// Append `count` empty blocks, returning their index range
    pub fn allocate_blocks(&mut self, count: u32) -> Result<Range<u32>> {
        let start = self.meta.total_blocks;
        let empty = Block::new(self.block_size)?;

        for index in start..start + count {
            self.store(index, &empty)?;
        }
        self.meta.save()?;

        tracing::debug!(
            "Allocated blocks {}..{} in {}",
            start,
            start + count,
            self.data_path.display()
        );

        Ok(start..start + count)
    }

    /// Truncate the run of empty blocks at the end of the file
    ///
    /// Stops at the first trailing block that holds records. Returns the number
    /// of blocks removed.
    pub fn trim_trailing_empty_blocks(&mut self) -> Result<u32> {
        let mut trimmed = 0;
        while self.meta.total_blocks > 0 && self.meta.empty.contains(&(self.meta.total_blocks - 1)) {
            self.meta.total_blocks -= 1;
            self.meta.forget(self.meta.total_blocks);
            trimmed += 1;
        }

        if trimmed == 0 {
            return Ok(0);
        }

        let file = OpenOptions::new().write(true).open(&self.data_path)?;
        file.set_len(self.offset(self.meta.total_blocks))?;
        self.meta.save()?;

        tracing::debug!(
            "Trimmed {} trailing empty blocks from {} ({} left)",
            trimmed,
            self.data_path.display(),
            self.meta.total_blocks
        );

        Ok(trimmed)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.data_path
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_factor(&self) -> usize {
        self.block_factor
    }

    pub fn total_blocks(&self) -> u32 {
        self.meta.total_blocks
    }

    pub fn total_records(&self) -> u64 {
        self.meta.total_records
    }

    /// Indices of blocks with no records
    pub fn empty_blocks(&self) -> &BTreeSet<u32> {
        &self.meta.empty
    }

    /// Indices of blocks with free slots and at least one record
    pub fn partial_blocks(&self) -> &BTreeSet<u32> {
        &self.meta.partial
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn offset(&self, index: u32) -> u64 {
        u64::from(index) * self.block_size as u64
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.meta.total_blocks {
            return Err(LinHashError::BlockOutOfRange {
                index,
                total: self.meta.total_blocks,
            });
        }
        Ok(())
    }

    /// Encode `block` into the slot at `index`, extending the file at the end
    fn write_at(&self, block: &Block<R, H>, index: u32) -> Result<()> {
        if block.block_size() != self.block_size {
            return Err(LinHashError::Decode(format!(
                "block of {} bytes written to a file of {}-byte blocks",
                block.block_size(),
                self.block_size
            )));
        }

        let bytes = block.to_bytes()?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.data_path)?;
        file.seek(SeekFrom::Start(self.offset(index)))?;
        file.write_all(&bytes)?;

        Ok(())
    }

    /// Write a block, count it if it extends the file, and reclassify it
    fn store(&mut self, index: u32, block: &Block<R, H>) -> Result<()> {
        if index > self.meta.total_blocks {
            return Err(LinHashError::BlockOutOfRange {
                index,
                total: self.meta.total_blocks,
            });
        }
        self.write_at(block, index)?;
        if index == self.meta.total_blocks {
            self.meta.total_blocks += 1;
        }
        self.meta
            .classify(index, block.valid_count(), self.block_factor);
        Ok(())
    }
}

// =============================================================================
// Chains
// =============================================================================

impl<R: Record> HeapFile<R, Chained> {
    /// Copy of the first record with the same key along the chain at `start`
    pub fn find_in_chain(&self, start: u32, key: &R) -> Result<Option<R>> {
        let mut current = Some(start);
        let mut steps = 0;

        while let Some(index) = current {
            self.check_steps(&mut steps)?;
            let block = self.get_block(index)?;
            if let Some(found) = block.find(key) {
                return Ok(Some(found));
            }
            current = block.next_block();
        }

        Ok(None)
    }

    /// Overwrite the record with the same key along the chain at `start`
    ///
    /// Only the block that changed is rewritten.
    pub fn edit_in_chain(&mut self, start: u32, record: &R) -> Result<bool> {
        let mut current = Some(start);
        let mut steps = 0;

        while let Some(index) = current {
            self.check_steps(&mut steps)?;
            let mut block = self.get_block(index)?;
            if block.update_record(record) {
                self.write_block(&block, index)?;
                return Ok(true);
            }
            current = block.next_block();
        }

        Ok(false)
    }

    /// Delete the record with the same key along the chain at `start`
    ///
    /// A block emptied by the deletion is unlinked from the chain and returned
    /// to the empty list, and trailing empty blocks are trimmed. If the
    /// starting block itself was unlinked, the caller must relink its
    /// predecessor to the reported new start.
    pub fn delete_from_chain(&mut self, start: u32, key: &R) -> Result<Option<(R, ChainHead)>> {
        let mut prev: Option<(u32, ChainedBlock<R>)> = None;
        let mut current = Some(start);
        let mut steps = 0;

        while let Some(index) = current {
            self.check_steps(&mut steps)?;
            let mut block = self.get_block(index)?;

            let Some(record) = block.remove_record(key) else {
                current = block.next_block();
                prev = Some((index, block));
                continue;
            };

            let mut head = ChainHead::Unchanged;
            if block.is_empty() {
                let next = block.next_block();
                match prev {
                    Some((prev_index, mut prev_block)) => {
                        prev_block.set_next_block(next);
                        self.write_block(&prev_block, prev_index)?;
                    }
                    None => head = ChainHead::Replaced(next),
                }
                block.set_next_block(None);
            }

            self.store(index, &block)?;
            self.meta.total_records -= 1;
            self.meta.save()?;
            self.trim_trailing_empty_blocks()?;

            return Ok(Some((record, head)));
        }

        Ok(None)
    }

    /// Every block of the chain at `start`, in chain order
    pub fn chain(&self, start: u32) -> Result<Vec<(u32, ChainedBlock<R>)>> {
        let mut blocks = Vec::new();
        let mut current = Some(start);
        let mut steps = 0;

        while let Some(index) = current {
            self.check_steps(&mut steps)?;
            let block = self.get_block(index)?;
            current = block.next_block();
            blocks.push((index, block));
        }

        Ok(blocks)
    }

    /// Next block index after `index`
    pub fn next_block_index(&self, index: u32) -> Result<Option<u32>> {
        Ok(self.get_block(index)?.next_block())
    }

    /// Point block `index` at `next` without touching its records
    pub fn set_next_block_index(&self, index: u32, next: Option<u32>) -> Result<()> {
        let mut block = self.get_block(index)?;
        block.set_next_block(next);
        self.write_block(&block, index)
    }

    /// A chain can never be longer than the file; a longer walk means a cycle
    fn check_steps(&self, steps: &mut u32) -> Result<()> {
        *steps += 1;
        if *steps > self.meta.total_blocks {
            return Err(LinHashError::Metadata(format!(
                "block chain in {} is longer than the file (cycle?)",
                self.data_path.display()
            )));
        }
        Ok(())
    }
}
