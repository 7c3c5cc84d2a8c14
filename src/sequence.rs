//! Sequence Generator
//!
//! Hands out increasing integer IDs (for example PCR test codes) and keeps
//! the last value in a text file. Callers own the generator and pass it where
//! IDs are needed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LinHashError, Result};

/// Persistent counter
#[derive(Debug)]
pub struct SequenceGenerator {
    path: PathBuf,
    current: i32,
}

impl SequenceGenerator {
    /// Open the counter stored at `path`, starting at 0 if it doesn't exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let current = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            contents.trim().parse().map_err(|_| {
                LinHashError::Metadata(format!(
                    "invalid sequence value {:?} in {}",
                    contents.trim(),
                    path.display()
                ))
            })?
        } else {
            0
        };

        Ok(Self { path, current })
    }

    /// Advance and persist, returning the new value
    pub fn next_value(&mut self) -> Result<i32> {
        let next = self.current.checked_add(1).ok_or_else(|| {
            LinHashError::Metadata(format!("sequence {} exhausted", self.path.display()))
        })?;
        self.current = next;
        self.save()?;
        Ok(next)
    }

    pub fn current_value(&self) -> i32 {
        self.current
    }

    /// Set the counter and persist it
    pub fn reset(&mut self, value: i32) -> Result<()> {
        self.current = value;
        self.save()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        fs::write(&self.path, self.current.to_string())?;
        Ok(())
    }
}
