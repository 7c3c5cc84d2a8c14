//! Hash Directory
//!
//! The `(level, next_split)` pair that fully determines bucket addressing.
//! Persisted as two text lines.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LinHashError, Result};

/// Addressing state of a linear hash file
///
/// The bucket space holds `2^level + next_split` buckets. Buckets below
/// `next_split` have already been split at the current level and are
/// addressed with one extra bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    path: PathBuf,
    level: u32,
    next_split: u32,
}

impl Directory {
    /// Fresh directory for `initial_buckets` buckets (must be a power of two)
    pub fn new(path: impl Into<PathBuf>, initial_buckets: u32) -> Result<Self> {
        if initial_buckets == 0 || !initial_buckets.is_power_of_two() {
            return Err(LinHashError::Config(format!(
                "initial_buckets must be a power of two greater than zero, got {}",
                initial_buckets
            )));
        }

        Ok(Self {
            path: path.into(),
            level: initial_buckets.trailing_zeros(),
            next_split: 0,
        })
    }

    /// Load a persisted directory
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?;
        let mut lines = contents.lines().map(str::trim);

        let level: u32 = parse_line(lines.next(), "level", &path)?;
        let next_split: u32 = parse_line(lines.next(), "nextSplit", &path)?;

        if level >= 31 || next_split >= (1 << level) {
            return Err(LinHashError::Metadata(format!(
                "invalid directory state level={} next_split={} in {}",
                level,
                next_split,
                path.display()
            )));
        }

        Ok(Self {
            path,
            level,
            next_split,
        })
    }

    /// Persist `(level, next_split)`
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, format!("{}\n{}\n", self.level, self.next_split))?;
        Ok(())
    }

    /// Bucket a key hash maps to under the current state
    pub fn bucket_for_hash(&self, hash: i64) -> u32 {
        let h = hash.unsigned_abs();
        let modulus = 1u64 << self.level;

        let mut bucket = h & (modulus - 1);
        if bucket < u64::from(self.next_split) {
            bucket = h & ((modulus << 1) - 1);
        }
        bucket as u32
    }

    /// Whether `hash` stays in the bucket being split, using `level + 1` bits
    pub fn stays_in_split_bucket(&self, hash: i64) -> bool {
        let mask = (1u64 << (self.level + 1)) - 1;
        hash.unsigned_abs() & mask == u64::from(self.next_split)
    }

    /// Index of the bucket the next split creates
    pub fn split_image(&self) -> u32 {
        self.next_split + (1 << self.level)
    }

    /// Move the split pointer past the bucket just split
    ///
    /// When every bucket of the level has been split the level increases and
    /// the pointer wraps to zero.
    pub fn advance(&mut self) {
        self.next_split += 1;
        if self.next_split == 1 << self.level {
            self.next_split = 0;
            self.level += 1;
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn next_split(&self) -> u32 {
        self.next_split
    }

    /// Number of addressable buckets
    pub fn bucket_count(&self) -> u32 {
        (1 << self.level) + self.next_split
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_line(line: Option<&str>, field: &str, path: &Path) -> Result<u32> {
    line.and_then(|l| l.parse().ok()).ok_or_else(|| {
        LinHashError::Metadata(format!("missing or invalid {} in {}", field, path.display()))
    })
}
