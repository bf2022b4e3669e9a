// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Singleton Lock & Socket Layout: guarantees at most one
//! daemon holds the on-disk identity at any instant.
//!
//! `acquire_lock` uses an exclusive (`O_EXCL`) create rather than an
//! advisory `flock`: the file's contents (owner pid) are what make a stale
//! lock reclaimable, which an advisory lock's held-for-the-process's-lifetime
//! semantics don't give us.

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use jj_core::{ErrorKind, HasErrorKind, LockRecord};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::warn;

/// A small bounded number of stale-lock reclaim attempts: a stale lock must
/// be reclaimable within a few retries, not retried forever.
const MAX_RECLAIM_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to read or write the lock file at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("lock file at {path} is held by another live daemon (pid {pid})")]
    Held { path: std::path::PathBuf, pid: u32 },
}

impl HasErrorKind for LockError {
    fn kind(&self) -> ErrorKind {
        match self {
            LockError::Io { .. } => ErrorKind::Io,
            LockError::Held { .. } => ErrorKind::Fatal,
        }
    }
}

/// An acquired Lock Record: releasing it (`release`) is the only way its
/// file is removed, so a daemon that forgets to call `release` on a clean
/// exit path leaves a stale-but-harmless file for the next reclaim.
pub struct LockGuard {
    path: std::path::PathBuf,
    record: LockRecord,
}

impl LockGuard {
    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    /// Remove the lock file, but only if it still names our own pid — a
    /// concurrent reclaim by another process must never be clobbered.
    /// Best-effort: errors are logged, never raised.
    pub fn release(self) {
        match read_record(&self.path) {
            Ok(Some(current)) if current.pid == self.record.pid => {
                if let Err(err) = std::fs::remove_file(&self.path) {
                    warn!(path = %self.path.display(), error = %err, "failed to remove lock file on release");
                }
            }
            Ok(_) => {
                // Somebody else already reclaimed it; nothing to do.
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read lock file during release");
            }
        }
    }
}

/// Attempt exclusive creation of the lock file, reclaiming a stale one (dead
/// owner pid) up to [`MAX_RECLAIM_ATTEMPTS`] times.
pub fn acquire_lock(session_tag: Option<String>, path: &Path) -> Result<LockGuard, LockError> {
    let record = LockRecord::for_self(session_tag, Utc::now());

    for _ in 0..MAX_RECLAIM_ATTEMPTS {
        match create_exclusive(path, &record) {
            Ok(()) => {
                return Ok(LockGuard {
                    path: path.to_path_buf(),
                    record,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                match read_record(path) {
                    Ok(Some(owner)) if owner_is_alive(owner.pid) => {
                        return Err(LockError::Held {
                            path: path.to_path_buf(),
                            pid: owner.pid,
                        });
                    }
                    Ok(_) => {
                        // Dead (or unreadable/corrupt) owner: reclaim and retry.
                        let _ = std::fs::remove_file(path);
                    }
                    Err(err) => {
                        return Err(LockError::Io {
                            path: path.to_path_buf(),
                            source: err,
                        });
                    }
                }
            }
            Err(source) => {
                return Err(LockError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    // Every attempt raced with another reclaimer; report the last-seen owner.
    let pid = read_record(path)
        .ok()
        .flatten()
        .map(|r| r.pid)
        .unwrap_or(0);
    Err(LockError::Held {
        path: path.to_path_buf(),
        pid,
    })
}

fn create_exclusive(path: &Path, record: &LockRecord) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    let json = serde_json::to_string_pretty(record).unwrap_or_default();
    file.write_all(json.as_bytes())
}

fn read_record(path: &Path) -> std::io::Result<Option<LockRecord>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents).ok()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Whether `pid` names a live process. Probing failure other than "no such
/// process" (most commonly permission denied for another user's process) is
/// treated as alive: safety over liveness.
fn owner_is_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
