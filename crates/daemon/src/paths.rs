// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout under the state directory:
//! `agent.lock.json`, `daemon.sock`, `state.json`, `history.jsonl`.

use std::path::PathBuf;
use thiserror::Error;

use jj_core::{ErrorKind, HasErrorKind};

#[derive(Debug, Error)]
pub enum PathsError {
    #[error("could not determine a state directory (set JELLY_J_STATE_DIR or $HOME)")]
    NoStateDir,
}

impl HasErrorKind for PathsError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}

/// The four on-disk artifacts the daemon owns, all rooted at one state
/// directory (default `<home>/.jelly-j/`, overridable by `JELLY_J_STATE_DIR`).
#[derive(Debug, Clone)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub socket_path: PathBuf,
    pub state_path: PathBuf,
    pub history_path: PathBuf,
    pub log_path: PathBuf,
    pub trace_path: PathBuf,
}

impl Paths {
    pub fn resolve() -> Result<Self, PathsError> {
        let state_dir = crate::env::state_dir().ok_or(PathsError::NoStateDir)?;
        Ok(Self::under(state_dir))
    }

    pub fn under(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("agent.lock.json"),
            socket_path: state_dir.join("daemon.sock"),
            state_path: state_dir.join("state.json"),
            history_path: state_dir.join("history.jsonl"),
            log_path: state_dir.join("daemon.log"),
            trace_path: state_dir.join("daemon.trace.log"),
            state_dir,
        }
    }

    pub fn create_state_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.state_dir)
    }
}
