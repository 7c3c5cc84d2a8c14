//! Engine Module
//!
//! The store facade that front ends and tools talk to.
//!
//! ## Responsibilities
//! - Create the data directory and derive every file path inside it
//! - Record creation parameters in the manifest and honour them on reopen
//! - Expose insert/find/edit/delete and the diagnostic accessors of the
//!   linear hash file

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::hash::{ChainEntry, HashFileStats, LinearHashFile};
use crate::manifest::StoreManifest;
use crate::record::Hashable;

/// A linear hash store of records `R` rooted in one data directory
///
/// ## Concurrency
/// Single-threaded and synchronous: every operation finishes its file I/O
/// before returning. One writer per data directory; no locking is done.
pub struct Engine<R> {
    /// Engine configuration (as given, before manifest overrides)
    config: Config,

    /// Parameters the store was created with
    manifest: StoreManifest,

    /// The record store
    hash_file: LinearHashFile<R>,
}

impl<R: Hashable> Engine<R> {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const PRIMARY_FILENAME: &'static str = "primary.bin";
    const OVERFLOW_FILENAME: &'static str = "overflow.bin";
    const MANIFEST_FILENAME: &'static str = "manifest.bin";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Read the manifest (existing store) and apply its layout parameters
    /// 2. Validate the resulting parameters
    /// 3. Create the data directory and write the manifest (new store)
    /// 4. Open the linear hash file
    pub fn open(config: Config) -> Result<Self> {
        // Paths are derived from data_dir, not configurable
        let manifest_path = config.data_dir.join(Self::MANIFEST_FILENAME);
        let primary_path = config.data_dir.join(Self::PRIMARY_FILENAME);
        let overflow_path = config.data_dir.join(Self::OVERFLOW_FILENAME);

        // Step 1: Stored parameters win over the config for an existing store
        let mut params = config.hash_params();
        let stored = if manifest_path.exists() {
            let manifest = StoreManifest::load(&manifest_path)?;
            manifest.check_record::<R>()?;

            let requested = params;
            manifest.apply(&mut params);
            if requested != params {
                tracing::info!(
                    "Using stored parameters for {}: {} initial buckets, block sizes {}/{}",
                    config.data_dir.display(),
                    manifest.initial_buckets,
                    manifest.primary_block_size,
                    manifest.overflow_block_size
                );
            }
            Some(manifest)
        } else {
            None
        };

        // Step 2: Only parameters that take effect are checked
        params.validate()?;

        // Step 3: New store: create the directory and record its parameters
        let manifest = match stored {
            Some(manifest) => manifest,
            None => {
                fs::create_dir_all(&config.data_dir)?;
                let manifest = StoreManifest::new::<R>(&params)?;
                manifest.save(&manifest_path)?;
                manifest
            }
        };

        // Step 4: Open the record store
        let hash_file = LinearHashFile::open(&primary_path, &overflow_path, params)?;

        Ok(Self {
            config,
            manifest,
            hash_file,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Insert a record; `false` if its key is already stored
    pub fn insert(&mut self, record: R) -> Result<bool> {
        self.hash_file.insert(record)
    }

    /// Find the record with the same key as `key`
    pub fn find(&self, key: &R) -> Result<Option<R>> {
        self.hash_file.find(key)
    }

    /// Replace the stored record with the same key; `false` if absent
    pub fn edit(&mut self, record: &R) -> Result<bool> {
        self.hash_file.edit(record)
    }

    /// Delete the record with the same key as `key`, returning it
    pub fn delete(&mut self, key: &R) -> Result<Option<R>> {
        self.hash_file.delete(key)
    }

    /// Blocks of one bucket's chain (primary head, then overflow blocks)
    pub fn bucket_chain(&self, bucket: u32) -> Result<Vec<ChainEntry<R>>> {
        self.hash_file.bucket_chain(bucket)
    }

    /// Records reachable from one bucket
    pub fn bucket_record_count(&self, bucket: u32) -> Result<usize> {
        self.hash_file.bucket_record_count(bucket)
    }

    pub fn bucket_count(&self) -> u32 {
        self.hash_file.bucket_count()
    }

    pub fn stats(&self) -> HashFileStats {
        self.hash_file.stats()
    }

    /// Close the store
    ///
    /// Every operation has already persisted its blocks and metadata; this only
    /// reports the final state.
    pub fn close(self) -> Result<()> {
        let stats = self.hash_file.stats();
        tracing::info!(
            "Closed store {}: {} records in {} buckets (level={}, next_split={})",
            self.config.data_dir.display(),
            stats.total_records(),
            stats.bucket_count,
            stats.level,
            stats.next_split
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the primary data file
    pub fn primary_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::PRIMARY_FILENAME)
    }

    /// Path of the overflow data file
    pub fn overflow_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::OVERFLOW_FILENAME)
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    pub fn hash_file(&self) -> &LinearHashFile<R> {
        &self.hash_file
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
