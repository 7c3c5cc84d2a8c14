//! # linhashdb
//!
//! A disk-resident, hash-organized record store with:
//! - Fixed-size, bit-exact block images of fixed-width records
//! - Heap files with free-space bookkeeping and tail truncation
//! - Linear hashing: the bucket space grows one split at a time
//! - Overflow chains for buckets whose head block is full
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │              (data dir, manifest, public API)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Linear Hash File                           │
//! │          (directory: level + split pointer)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Primary   │          │  Overflow   │
//!   │  Heap File  │          │  Heap File  │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          └───────────┬────────────┘
//!                      ▼
//!              ┌──────────────┐
//!              │ Block images │
//!              │  (records)   │
//!              └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod block;
pub mod heap;
pub mod hash;
pub mod manifest;
pub mod sequence;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LinHashError, Result};
pub use config::{Config, HashParams};
pub use engine::Engine;
pub use hash::LinearHashFile;
pub use heap::HeapFile;
pub use record::{Hashable, Record};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of linhashdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
