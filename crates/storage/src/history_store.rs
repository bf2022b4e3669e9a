// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL journal of conversational events.
//!
//! One [`jj_core::HistoryEntry`] per line. Writes are serialized through a
//! `parking_lot::Mutex` inside the single daemon task, so the single-writer
//! invariant holds without cross-process coordination. Entries are never
//! mutated or deleted once written.

use jj_core::HistoryEntry;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of entries returned by [`HistoryStore::read_snapshot`] when
/// the caller does not override the limit.
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 80;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to open history journal at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to append to history journal: {0}")]
    Write(#[source] std::io::Error),
}

/// The History Store: a single append-only journal under the state directory.
pub struct HistoryStore {
    path: PathBuf,
    writer: Mutex<File>,
}

impl HistoryStore {
    /// Open (creating if absent) the journal at `path` in append mode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| HistoryError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single JSON line. Serialization failure is a
    /// logic bug (`HistoryEntry` always serializes), so it is not part of
    /// the error type; an I/O failure is.
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        let mut line = serde_json::to_string(entry).unwrap_or_default();
        line.push('\n');
        let mut file = self.writer.lock();
        file.write_all(line.as_bytes())
            .map_err(HistoryError::Write)?;
        file.flush().map_err(HistoryError::Write)
    }

    /// Read the last `limit` entries in original order. Malformed lines
    /// (including a partial line from a crash mid-write) are silently
    /// skipped. A missing file yields an empty list.
    pub fn read_snapshot(&self, limit: usize) -> Vec<HistoryEntry> {
        read_snapshot_from(&self.path, limit)
    }
}

fn read_snapshot_from(path: &Path, limit: usize) -> Vec<HistoryEntry> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };
    let reader = BufReader::new(file);
    let mut ring: std::collections::VecDeque<HistoryEntry> =
        std::collections::VecDeque::with_capacity(limit.min(1024));
    for line in reader.lines() {
        let Ok(line) = line else { continue };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<HistoryEntry>(trimmed) else {
            continue;
        };
        if ring.len() == limit {
            ring.pop_front();
        }
        ring.push_back(entry);
    }
    ring.into_iter().collect()
}

#[cfg(test)]
#[path = "history_store_tests.rs"]
mod tests;
