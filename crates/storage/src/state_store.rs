// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic on-disk persistence for [`jj_core::ConversationState`] (`state.json`).
//!
//! Writes go through a temp-file-then-rename so a crash mid-write never
//! leaves `state.json` truncated or half-written: `rename(2)` within the
//! same directory is atomic on the filesystems this daemon targets.

use jj_core::ConversationState;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load `state.json`, returning [`ConversationState::default`] if the file
/// is absent (a fresh conversation with no resume token).
pub fn load(path: &Path) -> Result<ConversationState, StateStoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConversationState::default()),
        Err(source) => {
            return Err(StateStoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents).map_err(|source| StateStoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist `state` by writing to a sibling temp file and renaming it over
/// `path`.
pub fn save(path: &Path, state: &ConversationState) -> Result<(), StateStoreError> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let tmp_path = tmp_path_for(path);
    let json = serde_json::to_string_pretty(state).unwrap_or_default();
    std::fs::write(&tmp_path, json).map_err(|source| StateStoreError::Write {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| StateStoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state.json".into());
    name.push(format!(".tmp.{}", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
