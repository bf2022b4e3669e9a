// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of model aliases the conversation can run under.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A model alias, one of the closed set `{opus, haiku}`.
///
/// The wire protocol and `state.json` both carry the alias as its lowercase
/// name; [`ModelAlias::runtime_id`] maps it to the underlying Model Runtime
/// identifier the adapter actually invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelAlias {
    Opus,
    Haiku,
}

impl ModelAlias {
    pub const ALL: [ModelAlias; 2] = [ModelAlias::Opus, ModelAlias::Haiku];

    /// The default alias a fresh Conversation State starts with.
    pub const DEFAULT: ModelAlias = ModelAlias::Opus;

    /// The underlying Model Runtime model identifier for this alias.
    pub fn runtime_id(self) -> &'static str {
        match self {
            ModelAlias::Opus => "claude-opus-4-6",
            ModelAlias::Haiku => "claude-haiku-4-6",
        }
    }

    /// A cheap-model alias, used by the Heartbeat Probe's suggestion round-trip.
    pub fn cheap() -> ModelAlias {
        ModelAlias::Haiku
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelAlias::Opus => "opus",
            ModelAlias::Haiku => "haiku",
        }
    }
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized model alias string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown model alias: {0}")]
pub struct UnknownModelAlias(pub String);

impl FromStr for ModelAlias {
    type Err = UnknownModelAlias;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opus" => Ok(ModelAlias::Opus),
            "haiku" => Ok(ModelAlias::Haiku),
            other => Err(UnknownModelAlias(other.to_string())),
        }
    }
}

impl Default for ModelAlias {
    fn default() -> Self {
        ModelAlias::DEFAULT
    }
}

#[cfg(test)]
#[path = "model_alias_tests.rs"]
mod tests;
