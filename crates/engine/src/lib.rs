// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jj-engine: the Turn Queue & Executor and the Heartbeat Probe — the two
//! long-lived tasks that own `jelly-j`'s Conversation State and drive its
//! Model Runtime / Multiplexer collaborators.

pub mod context_prefix;
pub mod env;
pub mod error;
pub mod executor;
pub mod heartbeat;
pub mod stale_resume;
pub mod turn_request;

pub use error::EngineError;
pub use executor::{
    query_snapshot, Executor, ExecutorCommand, ExecutorSnapshot, TurnEventSink, TurnOutcome,
};
pub use heartbeat::{HeartbeatProbe, HEARTBEAT_FAILURE_THRESHOLD};
pub use stale_resume::is_stale_resume_error;
pub use turn_request::TurnRequest;
