//! Store Manifest
//!
//! The parameters a store was created with, so that it can be reopened from
//! its directory alone.
//!
//! Stored with bincode in `{data_dir}/manifest.bin`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::HashParams;
use crate::error::{LinHashError, Result};
use crate::record::Record;

/// Creation parameters of a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Manifest format version
    pub format_version: u16,

    /// Encoded record width the blocks were laid out for
    pub record_size: u32,

    pub initial_buckets: u32,
    pub primary_block_size: u32,
    pub overflow_block_size: u32,
}

impl StoreManifest {
    /// Current manifest format version
    pub const FORMAT_VERSION: u16 = 1;

    /// Describe a new store of records `R` created with `params`
    pub fn new<R: Record>(params: &HashParams) -> Result<Self> {
        Ok(Self {
            format_version: Self::FORMAT_VERSION,
            record_size: to_u32(R::SIZE, "record size")?,
            initial_buckets: params.initial_buckets,
            primary_block_size: to_u32(params.primary_block_size, "primary block size")?,
            overflow_block_size: to_u32(params.overflow_block_size, "overflow block size")?,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let manifest: Self = bincode::deserialize(&bytes)?;

        if manifest.format_version != Self::FORMAT_VERSION {
            return Err(LinHashError::Metadata(format!(
                "unsupported manifest version {} in {}",
                manifest.format_version,
                path.display()
            )));
        }

        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    /// Reject a store laid out for a different record width
    pub fn check_record<R: Record>(&self) -> Result<()> {
        if self.record_size as usize != R::SIZE {
            return Err(LinHashError::Config(format!(
                "store holds {}-byte records, opened with a {}-byte record type",
                self.record_size,
                R::SIZE
            )));
        }
        Ok(())
    }

    /// Override the layout parameters with the stored ones
    ///
    /// The split threshold is a runtime setting and is kept.
    pub fn apply(&self, params: &mut HashParams) {
        params.initial_buckets = self.initial_buckets;
        params.primary_block_size = self.primary_block_size as usize;
        params.overflow_block_size = self.overflow_block_size as usize;
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| LinHashError::Config(format!("{} {} does not fit in 32 bits", what, value)))
}
