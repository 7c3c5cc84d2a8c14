//! Linear Hash Module
//!
//! Maps keys to chains of blocks and grows the bucket space one bucket at a
//! time.
//!
//! ## Responsibilities
//! - Resolve a key to its bucket from the `(level, next_split)` directory
//! - Store records in the bucket's primary block, continuing into overflow blocks
//! - Split the bucket under the split pointer when the load factor is exceeded
//! - Enumerate bucket chains for diagnostics
//!
//! ## Layout
//! ```text
//!  primary file                  overflow file
//! ┌───────────┐
//! │ bucket 0  │──────────────▶ ┌────────────┐    ┌────────────┐
//! ├───────────┤                │ block 3    │───▶│ block 0    │──▶ -1
//! │ bucket 1  │──▶ -1          └────────────┘    └────────────┘
//! ├───────────┤
//! │ bucket 2  │──────────────▶ ┌────────────┐
//! ├───────────┤                │ block 1    │──▶ -1
//! │    ...    │                └────────────┘
//! └───────────┘
//! ```
//!
//! Bucket `b` is always primary block `b`; chain continuation blocks live only in
//! the overflow file.

mod directory;
mod linear;

pub use directory::Directory;
pub use linear::LinearHashFile;

/// Suffix of the directory sidecar, appended to the primary file name
pub const DIRECTORY_SUFFIX: &str = "_dir.txt";

/// Location of a block in one of the two files of a linear hash file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockAddress {
    /// Block in the primary file (the head of bucket `index`)
    Primary(u32),

    /// Chain continuation block in the overflow file
    Overflow(u32),
}

impl BlockAddress {
    /// Block index within its file
    pub fn index(&self) -> u32 {
        match self {
            BlockAddress::Primary(index) | BlockAddress::Overflow(index) => *index,
        }
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, BlockAddress::Overflow(_))
    }
}

/// One block of a bucket chain, as reported for diagnostics
#[derive(Debug, Clone)]
pub struct ChainEntry<R> {
    /// Where the block lives
    pub address: BlockAddress,
    /// Next overflow block, `None` at the end of the chain
    pub next: Option<u32>,
    /// Records per block in this file
    pub block_factor: usize,
    /// Valid records, in slot order
    pub records: Vec<R>,
}

impl<R> ChainEntry<R> {
    pub fn valid_count(&self) -> usize {
        self.records.len()
    }
}

/// Snapshot of a linear hash file's counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashFileStats {
    pub level: u32,
    pub next_split: u32,
    pub bucket_count: u32,
    pub primary_blocks: u32,
    pub primary_records: u64,
    pub overflow_blocks: u32,
    pub overflow_records: u64,
    pub load_factor: f64,
}

impl HashFileStats {
    /// Records across both files
    pub fn total_records(&self) -> u64 {
        self.primary_records + self.overflow_records
    }
}
