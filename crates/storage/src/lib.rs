// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jj-storage: the History Store (append-only JSONL journal) and the
//! Conversation State file (atomic write-then-rename).

mod history_store;
mod state_store;

pub use history_store::{HistoryError, HistoryStore, DEFAULT_SNAPSHOT_LIMIT};
pub use state_store::{load as load_state, save as save_state, StateStoreError};
