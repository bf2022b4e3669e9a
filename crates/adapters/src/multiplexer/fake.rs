// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scriptable [`MultiplexerAdapter`] double for Heartbeat Probe tests.

use super::{MultiplexerAdapter, MultiplexerError, PipeOp, PipeResponse};
use async_trait::async_trait;
use jj_core::EnvironmentContext;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Default)]
pub struct FakeMultiplexerAdapter {
    responses: Mutex<VecDeque<Result<PipeResponse, MultiplexerErrorKind>>>,
    calls: Mutex<Vec<PipeOp>>,
}

/// `MultiplexerError` isn't `Clone`, so scripted failures are stored as this
/// small copyable description and reified into a real error on replay.
#[derive(Clone)]
pub enum MultiplexerErrorKind {
    Timeout,
    NotReady,
}

impl FakeMultiplexerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, result: serde_json::Value) {
        self.responses
            .lock()
            .push_back(Ok(PipeResponse::Ok { result }));
    }

    pub fn push_error(&self, kind: MultiplexerErrorKind) {
        self.responses.lock().push_back(Err(kind));
    }

    pub fn calls(&self) -> Vec<PipeOp> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MultiplexerAdapter for FakeMultiplexerAdapter {
    async fn call(
        &self,
        _env: &EnvironmentContext,
        op: PipeOp,
    ) -> Result<PipeResponse, MultiplexerError> {
        self.calls.lock().push(op);
        match self.responses.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(MultiplexerErrorKind::Timeout)) => {
                Err(MultiplexerError::Timeout("fake timeout".into()))
            }
            Some(Err(MultiplexerErrorKind::NotReady)) => Ok(PipeResponse::Err {
                code: PipeResponse::NOT_READY.to_string(),
                error: "fake not ready".to_string(),
            }),
            None => Ok(PipeResponse::Ok {
                result: serde_json::Value::Null,
            }),
        }
    }
}
