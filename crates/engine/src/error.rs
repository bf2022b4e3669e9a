// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Turn Queue & Executor and Heartbeat Probe.

use jj_core::{ErrorKind, HasErrorKind};
use jj_storage::{HistoryError, StateStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("duplicate request id {0}: a turn with this id is already in flight or queued")]
    DuplicateRequestId(String),
    #[error("cannot start a new session while a turn is in flight")]
    NewSessionWhileBusy,
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    State(#[from] StateStoreError),
    #[error(transparent)]
    ModelRuntime(#[from] jj_adapters::ModelRuntimeError),
}

impl HasErrorKind for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            EngineError::DuplicateRequestId(_) => ErrorKind::Protocol,
            EngineError::NewSessionWhileBusy => ErrorKind::Protocol,
            EngineError::History(_) | EngineError::State(_) => ErrorKind::Io,
            EngineError::ModelRuntime(_) => ErrorKind::Fatal,
        }
    }
}
