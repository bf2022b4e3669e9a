// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! jj-adapters: the Model Runtime Adapter and the Multiplexer Adapter —
//! the two external-process collaborators `jelly-j`'s core talks to over a
//! narrow streaming/RPC contract.

pub mod config_roots;
pub mod env;
pub mod model_runtime;
pub mod multiplexer;
pub mod subprocess;

pub use config_roots::ConfigRoots;
pub use model_runtime::{
    ChatTurnInput, ChatTurnOutput, ClaudeModelRuntimeAdapter, ModelRuntimeAdapter,
    ModelRuntimeError, ModelTurnEvents, PermissionDecision, PermissionPolicy,
};
pub use multiplexer::{
    MultiplexerAdapter, MultiplexerError, PipeOp, PipeResponse, ZellijMultiplexerAdapter,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use model_runtime::fake::{FakeModelRuntimeAdapter, ScriptedTurn};
#[cfg(any(test, feature = "test-support"))]
pub use multiplexer::fake::FakeMultiplexerAdapter;
