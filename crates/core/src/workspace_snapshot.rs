// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Cached Workspace Snapshot: an opaque-to-the-core structure the
//! butler plugin produces on demand. The core only consumes it in the
//! Heartbeat Probe and forwards it to the model as prompt context.

use serde::{Deserialize, Serialize};

/// One tab in the workspace, as reported by the plugin's `get_state` op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub position: usize,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub selectable_pane_count: usize,
}

/// One pane, as reported by the plugin's `get_state` op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneSnapshot {
    pub id: u32,
    pub tab_index: usize,
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub is_plugin: bool,
    #[serde(default)]
    pub is_floating: bool,
    #[serde(default)]
    pub is_suppressed: bool,
    #[serde(default)]
    pub exited: bool,
}

/// The full snapshot returned by the plugin's pipe RPC `get_state` op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub tabs: Vec<TabSnapshot>,
    #[serde(default)]
    pub panes: Vec<PaneSnapshot>,
}

/// Pattern the Heartbeat Probe uses to recognize an auto-generated,
/// never-renamed tab (e.g. a multiplexer's default `Tab #1`, `Tab #2`, ...).
pub fn is_default_tab_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("Tab #") else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// Threshold above which a tab is considered crowded.
pub const CROWDED_TAB_PANE_THRESHOLD: usize = 4;

impl WorkspaceSnapshot {
    /// True when any tab still carries the multiplexer's default name.
    pub fn has_default_named_tab(&self) -> bool {
        self.tabs.iter().any(|t| is_default_tab_name(&t.name))
    }

    /// True when any tab exceeds the crowded-pane threshold.
    pub fn has_crowded_tab(&self) -> bool {
        self.tabs
            .iter()
            .any(|t| t.selectable_pane_count > CROWDED_TAB_PANE_THRESHOLD)
    }

    /// Whether the heartbeat should bother consulting the model at all for
    /// this snapshot.
    pub fn warrants_suggestion(&self) -> bool {
        self.has_default_named_tab() || self.has_crowded_tab()
    }
}

#[cfg(test)]
#[path = "workspace_snapshot_tests.rs"]
mod tests;
