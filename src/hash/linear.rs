//! Linear Hash File
//!
//! Bucket resolution, chained insertion and incremental splitting.

use std::path::Path;

use crate::block::Chained;
use crate::config::HashParams;
use crate::error::{LinHashError, Result};
use crate::heap::{sidecar_path, ChainHead, HeapFile, InsertOutcome};
use crate::record::Hashable;

use super::{BlockAddress, ChainEntry, Directory, HashFileStats, DIRECTORY_SUFFIX};

/// A hash-organized record store that grows by linear hashing
///
/// ## Files
/// - primary heap file: one chained block per bucket (bucket `b` == block `b`)
/// - overflow heap file: chain continuation blocks
/// - `<primary>_dir.txt`: the `(level, next_split)` directory
///
/// ## Growth
/// After every insert the load factor
/// `primary records / (bucket count × primary block factor)` is compared with
/// the split threshold; above it, the bucket under the split pointer is split
/// into itself and bucket `next_split + 2^level`.
pub struct LinearHashFile<R> {
    /// Bucket head blocks
    primary: HeapFile<R, Chained>,

    /// Overflow chain blocks
    overflow: HeapFile<R, Chained>,

    /// Addressing state (persisted)
    directory: Directory,

    /// Load factor that triggers a split
    split_threshold: f64,
}

impl<R: Hashable> LinearHashFile<R> {
    /// Open or create a linear hash file
    ///
    /// On creation the primary file is pre-sized to `initial_buckets` empty
    /// blocks. On reopen the directory is reloaded and must agree with the
    /// primary file's block count; the `initial_buckets` parameter is then
    /// ignored.
    pub fn open(
        primary_path: impl AsRef<Path>,
        overflow_path: impl AsRef<Path>,
        params: HashParams,
    ) -> Result<Self> {
        params.validate()?;

        let primary_path = primary_path.as_ref();
        let directory_path = sidecar_path(primary_path, DIRECTORY_SUFFIX);

        let mut primary = HeapFile::open(primary_path, params.primary_block_size)?;
        let overflow = HeapFile::open(overflow_path, params.overflow_block_size)?;

        let directory = if directory_path.exists() {
            let directory = Directory::load(&directory_path)?;
            if primary.total_blocks() != directory.bucket_count() {
                return Err(LinHashError::Metadata(format!(
                    "directory addresses {} buckets but {} holds {} blocks",
                    directory.bucket_count(),
                    primary_path.display(),
                    primary.total_blocks()
                )));
            }

            tracing::info!(
                "Opened linear hash file {}: level={}, next_split={}, buckets={}",
                primary_path.display(),
                directory.level(),
                directory.next_split(),
                directory.bucket_count()
            );
            directory
        } else {
            let directory = Directory::new(&directory_path, params.initial_buckets)?;
            if primary.total_blocks() != 0 {
                return Err(LinHashError::Metadata(format!(
                    "{} already holds {} blocks but has no directory",
                    primary_path.display(),
                    primary.total_blocks()
                )));
            }

            primary.allocate_blocks(params.initial_buckets)?;
            directory.save()?;

            tracing::info!(
                "Created linear hash file {} with {} buckets",
                primary_path.display(),
                params.initial_buckets
            );
            directory
        };

        Ok(Self {
            primary,
            overflow,
            directory,
            split_threshold: params.split_threshold,
        })
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Insert a record
    ///
    /// Returns `false` without changing anything if a record with the same key
    /// is already stored. May split one bucket afterwards.
    pub fn insert(&mut self, record: R) -> Result<bool> {
        if self.find(&record)?.is_some() {
            return Ok(false);
        }

        let bucket = self.bucket_for_key(&record);
        self.insert_into_bucket(bucket, record)?;

        if self.load_factor() > self.split_threshold {
            self.split_next_bucket()?;
        }

        Ok(true)
    }

    /// Copy of the stored record with the same key
    pub fn find(&self, key: &R) -> Result<Option<R>> {
        let bucket = self.bucket_for_key(key);
        let head = self.primary.get_block(bucket)?;

        if let Some(found) = head.find(key) {
            return Ok(Some(found));
        }

        match head.next_block() {
            Some(next) => self.overflow.find_in_chain(next, key),
            None => Ok(None),
        }
    }

    /// Replace the stored record with the same key
    ///
    /// Returns `false` if no such record exists. Only the block holding the
    /// record is rewritten.
    pub fn edit(&mut self, record: &R) -> Result<bool> {
        let bucket = self.bucket_for_key(record);
        let mut head = self.primary.get_block(bucket)?;

        if head.update_record(record) {
            self.primary.write_block(&head, bucket)?;
            return Ok(true);
        }

        match head.next_block() {
            Some(next) => self.overflow.edit_in_chain(next, record),
            None => Ok(false),
        }
    }

    /// Delete the record with the same key, returning it
    ///
    /// Overflow blocks emptied by the deletion are unlinked and the overflow
    /// file is trimmed. Bucket head blocks stay in place even when empty.
    pub fn delete(&mut self, key: &R) -> Result<Option<R>> {
        let bucket = self.bucket_for_key(key);
        let head = self.primary.get_block(bucket)?;

        if head.records().iter().any(|r| r.is_equal(key)) {
            return self.primary.remove_record(bucket, key);
        }

        let Some(next) = head.next_block() else {
            return Ok(None);
        };

        match self.overflow.delete_from_chain(next, key)? {
            Some((record, ChainHead::Replaced(new_next))) => {
                self.primary.set_next_block_index(bucket, new_next)?;
                Ok(Some(record))
            }
            Some((record, ChainHead::Unchanged)) => Ok(Some(record)),
            None => Ok(None),
        }
    }

    /// Split the bucket under the split pointer
    ///
    /// Every record of the bucket's chain is collected, the chain is reset to
    /// an empty head block, and the records are reinserted into either the
    /// same bucket or bucket `next_split + 2^level`, chosen with `level + 1`
    /// hash bits. Reinsertion never triggers another split. Splitting an empty
    /// bucket still advances the pointer.
    pub fn split_next_bucket(&mut self) -> Result<()> {
        let bucket = self.directory.next_split();
        let image = self.directory.split_image();

        // Step 1: Collect the chain and reset it
        let mut head = self.primary.take_block(bucket)?;
        let mut records = head.take_records();
        let mut next = head.next_block();
        let mut freed = 0u32;

        while let Some(index) = next {
            freed += 1;
            if freed > self.overflow.total_blocks() {
                return Err(self.cycle_error(bucket));
            }
            let mut block = self.overflow.take_block(index)?;
            records.extend(block.take_records());
            next = block.next_block();
        }

        // Step 2: Make sure the new bucket's head block exists
        while self.primary.total_blocks() <= image {
            self.primary.allocate_empty_block()?;
        }

        // Step 3: Redistribute with one more hash bit
        let (stay, moved): (Vec<R>, Vec<R>) = records
            .into_iter()
            .partition(|r| self.directory.stays_in_split_bucket(r.key_hash()));

        let (stayed, relocated) = (stay.len(), moved.len());
        for record in stay {
            self.insert_into_bucket(bucket, record)?;
        }
        for record in moved {
            self.insert_into_bucket(image, record)?;
        }

        // Step 4: Advance the split pointer and persist
        self.directory.advance();
        self.directory.save()?;

        self.overflow.trim_trailing_empty_blocks()?;

        tracing::debug!(
            "Split bucket {} into {} ({} stayed, {} moved, {} overflow blocks released); level={}, next_split={}",
            bucket,
            image,
            stayed,
            relocated,
            freed,
            self.directory.level(),
            self.directory.next_split()
        );

        Ok(())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// The blocks of a bucket's chain: primary head first, then overflow blocks
    pub fn bucket_chain(&self, bucket: u32) -> Result<Vec<ChainEntry<R>>> {
        self.check_bucket(bucket)?;

        let mut head = self.primary.get_block(bucket)?;
        let next = head.next_block();
        let mut entries = vec![ChainEntry {
            address: BlockAddress::Primary(bucket),
            next,
            block_factor: head.block_factor(),
            records: head.take_records(),
        }];

        if let Some(start) = next {
            for (index, mut block) in self.overflow.chain(start)? {
                entries.push(ChainEntry {
                    address: BlockAddress::Overflow(index),
                    next: block.next_block(),
                    block_factor: block.block_factor(),
                    records: block.take_records(),
                });
            }
        }

        Ok(entries)
    }

    /// Number of records reachable from a bucket
    pub fn bucket_record_count(&self, bucket: u32) -> Result<usize> {
        Ok(self
            .bucket_chain(bucket)?
            .iter()
            .map(ChainEntry::valid_count)
            .sum())
    }

    /// Counters of both files and the directory
    pub fn stats(&self) -> HashFileStats {
        HashFileStats {
            level: self.directory.level(),
            next_split: self.directory.next_split(),
            bucket_count: self.directory.bucket_count(),
            primary_blocks: self.primary.total_blocks(),
            primary_records: self.primary.total_records(),
            overflow_blocks: self.overflow.total_blocks(),
            overflow_records: self.overflow.total_records(),
            load_factor: self.load_factor(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Bucket the record's key maps to under the current directory state
    pub fn bucket_for_key(&self, key: &R) -> u32 {
        self.directory.bucket_for_hash(key.key_hash())
    }

    /// Primary records per bucket capacity
    pub fn load_factor(&self) -> f64 {
        let capacity =
            f64::from(self.directory.bucket_count()) * self.primary.block_factor() as f64;
        self.primary.total_records() as f64 / capacity
    }

    pub fn level(&self) -> u32 {
        self.directory.level()
    }

    pub fn next_split(&self) -> u32 {
        self.directory.next_split()
    }

    pub fn bucket_count(&self) -> u32 {
        self.directory.bucket_count()
    }

    /// Records across both files
    pub fn total_records(&self) -> u64 {
        self.primary.total_records() + self.overflow.total_records()
    }

    pub fn split_threshold(&self) -> f64 {
        self.split_threshold
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn primary(&self) -> &HeapFile<R, Chained> {
        &self.primary
    }

    pub fn overflow(&self) -> &HeapFile<R, Chained> {
        &self.overflow
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Store a record in a bucket's chain without checking the load factor
    ///
    /// Fills the first block of the chain with a free slot; if every block is
    /// full, a new overflow block is linked after the tail.
    fn insert_into_bucket(&mut self, bucket: u32, record: R) -> Result<BlockAddress> {
        let (mut tail, mut next, mut record) = match self.primary.insert_record_at(record, bucket)? {
            InsertOutcome::Inserted { .. } => return Ok(BlockAddress::Primary(bucket)),
            InsertOutcome::Full { block, record, .. } => {
                (BlockAddress::Primary(bucket), block.next_block(), record)
            }
        };

        let mut steps = 0u32;
        while let Some(index) = next {
            steps += 1;
            if steps > self.overflow.total_blocks() {
                return Err(self.cycle_error(bucket));
            }

            match self.overflow.insert_record_at(record, index)? {
                InsertOutcome::Inserted { .. } => return Ok(BlockAddress::Overflow(index)),
                InsertOutcome::Full {
                    block,
                    record: returned,
                    ..
                } => {
                    tail = BlockAddress::Overflow(index);
                    next = block.next_block();
                    record = returned;
                }
            }
        }

        let (index, _) = self.overflow.insert_record_as_new_block(record)?;
        self.heap(tail)
            .set_next_block_index(tail.index(), Some(index))?;

        tracing::debug!(
            "Bucket {} chain extended with overflow block {} after {:?}",
            bucket,
            index,
            tail
        );

        Ok(BlockAddress::Overflow(index))
    }

    fn heap(&self, address: BlockAddress) -> &HeapFile<R, Chained> {
        match address {
            BlockAddress::Primary(_) => &self.primary,
            BlockAddress::Overflow(_) => &self.overflow,
        }
    }

    fn check_bucket(&self, bucket: u32) -> Result<()> {
        if bucket >= self.directory.bucket_count() {
            return Err(LinHashError::BucketOutOfRange {
                bucket,
                buckets: self.directory.bucket_count(),
            });
        }
        Ok(())
    }

    fn cycle_error(&self, bucket: u32) -> LinHashError {
        LinHashError::Metadata(format!(
            "chain of bucket {} is longer than the overflow file (cycle?)",
            bucket
        ))
    }
}
