// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

/// Binary name (or path) used to invoke the external model runtime
///. Defaults to `claude`.
pub fn model_runtime_bin() -> String {
    std::env::var("JELLY_J_MODEL_RUNTIME_BIN").unwrap_or_else(|_| "claude".to_string())
}

/// Binary name (or path) used to invoke the terminal multiplexer CLI for
/// pipe-RPC calls to the butler plugin.
pub fn multiplexer_bin() -> String {
    std::env::var("JELLY_J_MULTIPLEXER_BIN").unwrap_or_else(|_| "zellij".to_string())
}
