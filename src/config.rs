//! Configuration for linhashdb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LinHashError, Result};

/// Main configuration for a linhashdb store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── manifest.bin             (store parameters)
    ///     ├── primary.bin              (one block per bucket)
    ///     ├── primary.bin_header.txt   (block/record counts)
    ///     ├── primary.bin_empty.txt    (empty block indices)
    ///     ├── primary.bin_partial.txt  (partially full block indices)
    ///     ├── primary.bin_dir.txt      (hash directory: level, next split)
    ///     └── overflow.bin + sidecars  (chain continuation blocks)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Hashing Configuration
    // -------------------------------------------------------------------------
    /// Number of buckets a new store starts with (power of two)
    pub initial_buckets: u32,

    /// Load factor above which the next bucket is split
    pub split_threshold: f64,

    // -------------------------------------------------------------------------
    // Block Configuration
    // -------------------------------------------------------------------------
    /// Block size of the primary file (in bytes)
    pub primary_block_size: usize,

    /// Block size of the overflow file (in bytes)
    pub overflow_block_size: usize,
}

/// Parameters consumed by [`crate::hash::LinearHashFile::open`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashParams {
    pub initial_buckets: u32,
    pub primary_block_size: usize,
    pub overflow_block_size: usize,
    pub split_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./linhash_data"),
            initial_buckets: 4,
            split_threshold: 0.75,
            primary_block_size: 1024,
            overflow_block_size: 512,
        }
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Config::default().hash_params()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check construction parameters
    pub fn validate(&self) -> Result<()> {
        self.hash_params().validate()
    }

    /// The subset of the config the hash file needs
    pub fn hash_params(&self) -> HashParams {
        HashParams {
            initial_buckets: self.initial_buckets,
            primary_block_size: self.primary_block_size,
            overflow_block_size: self.overflow_block_size,
            split_threshold: self.split_threshold,
        }
    }
}

impl HashParams {
    /// Reject parameters no store can be built from
    pub fn validate(&self) -> Result<()> {
        if self.initial_buckets == 0 || !self.initial_buckets.is_power_of_two() {
            return Err(LinHashError::Config(format!(
                "initial_buckets must be a power of two greater than zero, got {}",
                self.initial_buckets
            )));
        }

        if !self.split_threshold.is_finite() || self.split_threshold <= 0.0 {
            return Err(LinHashError::Config(format!(
                "split_threshold must be a positive number, got {}",
                self.split_threshold
            )));
        }

        // Block sizes are checked against the record width when the heap files open
        if self.primary_block_size == 0 || self.overflow_block_size == 0 {
            return Err(LinHashError::Config(
                "block sizes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the initial bucket count
    pub fn initial_buckets(mut self, buckets: u32) -> Self {
        self.config.initial_buckets = buckets;
        self
    }

    /// Set the split threshold (load factor)
    pub fn split_threshold(mut self, threshold: f64) -> Self {
        self.config.split_threshold = threshold;
        self
    }

    /// Set the primary block size (in bytes)
    pub fn primary_block_size(mut self, size: usize) -> Self {
        self.config.primary_block_size = size;
        self
    }

    /// Set the overflow block size (in bytes)
    pub fn overflow_block_size(mut self, size: usize) -> Self {
        self.config.overflow_block_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
