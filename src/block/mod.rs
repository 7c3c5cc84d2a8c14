//! Block Module
//!
//! Fixed-capacity, fixed-byte-length containers of records.
//!
//! ## Responsibilities
//! - Hold up to `block_factor` records plus a valid-count header
//! - Pack/unpack to a buffer of exactly `block_size` bytes
//! - Keep occupied slots as a dense prefix (removal shifts later slots down)
//!
//! ## Layout (big-endian)
//! ```text
//! Plain block:
//! ┌──────────────┬──────────────────────────────┬─────────────┐
//! │ Valid: i32   │ block_factor × record slots  │ zero pad    │
//! └──────────────┴──────────────────────────────┴─────────────┘
//!
//! Chained block:
//! ┌──────────────┬──────────────┬──────────────────────────────┬──────────┐
//! │ Valid: i32   │ Next: i32    │ block_factor × record slots  │ zero pad │
//! └──────────────┴──────────────┴──────────────────────────────┴──────────┘
//!
//! Empty slots are zero-filled. Next = -1 ends the chain.
//! ```

mod container;
mod header;

pub use container::Block;
pub use header::{BlockHeader, Chained, Plain};

/// Size of the valid-count field that starts every block
pub const VALID_COUNT_SIZE: usize = 4;

/// On-disk next-block value marking the end of a chain
pub const END_OF_CHAIN: i32 = -1;

/// A block without a chain link
pub type PlainBlock<R> = Block<R, Plain>;

/// A block that links to the next block of its bucket chain
pub type ChainedBlock<R> = Block<R, Chained>;
