// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error-kind taxonomy shared by every fallible operation in the daemon.
//!
//! Every crate's `thiserror` error enum implements [`HasErrorKind`] so call
//! sites can branch on the kind without matching every variant. Only
//! `Fatal` propagates to process exit; everything else is caught and
//! converted to the appropriate wire frame or log line.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed JSON, unknown message type, frame from an unregistered
    /// transport.
    Protocol,
    /// Permission/policy denial from the Model Runtime Adapter.
    Permission,
    /// A structured error matching the stale-conversation pattern.
    StaleResume,
    /// A subprocess or IO call exceeded its deadline.
    Timeout,
    /// Filesystem or other IO failure not covered by a more specific kind.
    Io,
    /// Threatens an invariant; propagates to scheduler/process exit.
    Fatal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Protocol => "protocol",
            ErrorKind::Permission => "permission",
            ErrorKind::StaleResume => "stale_resume",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Io => "io",
            ErrorKind::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every crate-local error enum so callers can branch on
/// severity without a full match.
pub trait HasErrorKind {
    fn kind(&self) -> ErrorKind;
}

#[cfg(test)]
#[path = "error_kind_tests.rs"]
mod tests;
