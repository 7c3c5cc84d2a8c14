//! Heap file metadata
//!
//! Block/record counts and the two free lists, persisted as text sidecars
//! next to the data file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LinHashError, Result};

use super::{EMPTY_SUFFIX, HEADER_SUFFIX, PARTIAL_SUFFIX};

/// Counts and free lists of one heap file
///
/// A block index is in at most one of `empty` and `partial`; full blocks are in
/// neither.
#[derive(Debug)]
pub(crate) struct HeapMetadata {
    header_path: PathBuf,
    empty_path: PathBuf,
    partial_path: PathBuf,
    pub(crate) total_blocks: u32,
    pub(crate) total_records: u64,
    pub(crate) empty: BTreeSet<u32>,
    pub(crate) partial: BTreeSet<u32>,
}

impl HeapMetadata {
    /// Fresh metadata for a data file with no blocks
    pub(crate) fn new(data_path: &Path) -> Self {
        Self {
            header_path: sidecar_path(data_path, HEADER_SUFFIX),
            empty_path: sidecar_path(data_path, EMPTY_SUFFIX),
            partial_path: sidecar_path(data_path, PARTIAL_SUFFIX),
            total_blocks: 0,
            total_records: 0,
            empty: BTreeSet::new(),
            partial: BTreeSet::new(),
        }
    }

    /// Reload counts and lists from the sidecars
    pub(crate) fn load(&mut self) -> Result<()> {
        let header = fs::read_to_string(&self.header_path).map_err(|e| {
            LinHashError::Metadata(format!(
                "cannot read {}: {}",
                self.header_path.display(),
                e
            ))
        })?;

        let mut lines = header.lines().map(str::trim);
        self.total_blocks = parse_line(lines.next(), "totalBlocks", &self.header_path)?;
        self.total_records = parse_line(lines.next(), "totalRecords", &self.header_path)?;

        self.empty = load_list(&self.empty_path)?;
        self.partial = load_list(&self.partial_path)?;

        // A stale list entry past the end would be handed out as a block index
        let total = self.total_blocks;
        self.empty.retain(|&index| index < total);
        self.partial.retain(|&index| index < total);
        for index in &self.empty {
            self.partial.remove(index);
        }

        Ok(())
    }

    /// Persist counts and lists
    pub(crate) fn save(&self) -> Result<()> {
        fs::write(
            &self.header_path,
            format!("{}\n{}\n", self.total_blocks, self.total_records),
        )?;
        save_list(&self.empty_path, &self.empty)?;
        save_list(&self.partial_path, &self.partial)?;
        Ok(())
    }

    /// Move a block index into the list matching its fill level
    pub(crate) fn classify(&mut self, index: u32, valid_count: usize, block_factor: usize) {
        if valid_count == 0 {
            self.partial.remove(&index);
            self.empty.insert(index);
        } else if valid_count < block_factor {
            self.empty.remove(&index);
            self.partial.insert(index);
        } else {
            self.empty.remove(&index);
            self.partial.remove(&index);
        }
    }

    /// Drop an index from both lists (the block no longer exists)
    pub(crate) fn forget(&mut self, index: u32) {
        self.empty.remove(&index);
        self.partial.remove(&index);
    }
}

/// `<data file name><suffix>` in the data file's directory
pub(crate) fn sidecar_path(data_path: &Path, suffix: &str) -> PathBuf {
    let mut name = data_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    data_path.with_file_name(name)
}

fn parse_line<T: std::str::FromStr>(line: Option<&str>, field: &str, path: &Path) -> Result<T> {
    line.and_then(|l| l.parse().ok()).ok_or_else(|| {
        LinHashError::Metadata(format!("missing or invalid {} in {}", field, path.display()))
    })
}

fn load_list(path: &Path) -> Result<BTreeSet<u32>> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }

    let mut list = BTreeSet::new();
    for line in fs::read_to_string(path)?.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse() {
            Ok(index) => {
                list.insert(index);
            }
            Err(_) => tracing::warn!("Skipping malformed line {:?} in {}", line, path.display()),
        }
    }
    Ok(list)
}

fn save_list(path: &Path, list: &BTreeSet<u32>) -> Result<()> {
    let contents: String = list.iter().map(|index| format!("{}\n", index)).collect();
    fs::write(path, contents)?;
    Ok(())
}
