//! Error types for linhashdb
//!
//! Provides a unified error type for all operations.
//!
//! Capacity (`BlockFull`) is handled inside the hash file and never reaches
//! callers of the public operations. A missing key is not an error: lookups
//! return `Option` and edits return `bool`.

use thiserror::Error;

/// Result type alias using LinHashError
pub type Result<T> = std::result::Result<T, LinHashError>;

/// Unified error type for linhashdb operations
#[derive(Debug, Error)]
pub enum LinHashError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Layout Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    #[error("Block is full")]
    BlockFull,

    #[error("Block index {index} out of range (total blocks: {total})")]
    BlockOutOfRange { index: u32, total: u32 },

    #[error("Bucket {bucket} out of range (bucket count: {buckets})")]
    BucketOutOfRange { bucket: u32, buckets: u32 },

    // -------------------------------------------------------------------------
    // Metadata Errors
    // -------------------------------------------------------------------------
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for LinHashError {
    fn from(err: bincode::Error) -> Self {
        LinHashError::Serialization(err.to_string())
    }
}
