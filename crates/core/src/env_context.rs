// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-request Environment Context: the multiplexer identity a turn's
//! tool subprocesses should target.
//!
//! The daemon is detached from the shell that spawned it, so it cannot rely
//! on its own process environment to find the right multiplexer session.
//! Every request instead carries this small struct, captured at connection
//! or request-admission time and threaded into the adapter and any
//! tool-invocation subprocess.

use serde::{Deserialize, Serialize};

/// The multiplexer IPC address and an optional binary override, bundled as
/// the wire protocol's `zellijEnv` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplexerEnv {
    /// Path to the per-session multiplexer IPC socket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_path: Option<String>,
    /// Explicit override for the multiplexer binary to shell out to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<String>,
}

/// A mapping of recognized keys {IPC-socket path, session name, binary path}
/// captured per connection and forwarded into every subprocess the daemon
/// spawns on that client's behalf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    /// The multiplexer session name (wire field `zellijSession`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    /// The IPC socket path / binary override (wire field `zellijEnv`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplexer_env: Option<MultiplexerEnv>,
}

impl EnvironmentContext {
    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    pub fn ipc_path(&self) -> Option<&str> {
        self.multiplexer_env.as_ref()?.ipc_path.as_deref()
    }

    pub fn binary_path(&self) -> Option<&str> {
        self.multiplexer_env.as_ref()?.binary_path.as_deref()
    }

    /// Merge `self` over `fallback`: any field `self` leaves unset is taken
    /// from `fallback`. Used by the Executor to fall back to a registration's
    /// last-seen environment when a request omits one.
    pub fn or(self, fallback: EnvironmentContext) -> EnvironmentContext {
        EnvironmentContext {
            session_name: self.session_name.or(fallback.session_name),
            multiplexer_env: self.multiplexer_env.or(fallback.multiplexer_env),
        }
    }
}

#[cfg(test)]
#[path = "env_context_tests.rs"]
mod tests;
