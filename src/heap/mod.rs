//! Heap File Module
//!
//! Block-addressable persistent storage with reuse of freed space.
//!
//! ## Responsibilities
//! - Random access read/write of fixed-size blocks by index
//! - Free-space bookkeeping (empty and partially-empty block lists)
//! - Appending new blocks and truncating trailing empty ones
//! - Walking chains of linked blocks within one file
//!
//! ## Files
//! ```text
//! {data}               block images, block i at offset i * block_size
//! {data}_header.txt    totalBlocks, totalRecords (one per line)
//! {data}_empty.txt     indices of empty blocks (one per line)
//! {data}_partial.txt   indices of partially-full blocks (one per line)
//! ```
//!
//! Every file is opened, seeked and closed within a single operation, and every
//! structural mutation rewrites the sidecars before it returns.

mod file;
mod metadata;

pub use file::{ChainHead, HeapFile, InsertOutcome};

pub(crate) use metadata::sidecar_path;

/// Suffix of the counts sidecar
pub const HEADER_SUFFIX: &str = "_header.txt";

/// Suffix of the empty-block list sidecar
pub const EMPTY_SUFFIX: &str = "_empty.txt";

/// Suffix of the partial-block list sidecar
pub const PARTIAL_SUFFIX: &str = "_partial.txt";
