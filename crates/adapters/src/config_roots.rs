// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration-root discovery for the Model Runtime Adapter's file-write
//! permission policy.
//!
//! A configuration root is a directory containing a recognized project
//! marker. File writes inside a configuration root run without a permission
//! prompt; writes outside every known root always prompt.

use std::path::{Path, PathBuf};

/// Marker files that identify a directory as a configuration root.
const MARKERS: &[&str] = &[".git", "package.json", "Cargo.toml"];

/// Walk `start`'s ancestry looking for directories carrying a recognized
/// project marker, and return every one found (closest first). The walk is
/// shallow: it only inspects direct children of each ancestor directory, it
/// never recurses into subdirectories.
pub fn discover_roots(start: &Path) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let mut dir = Some(start);
    while let Some(candidate) = dir {
        if MARKERS.iter().any(|marker| candidate.join(marker).exists()) {
            roots.push(candidate.to_path_buf());
        }
        dir = candidate.parent();
    }
    roots
}

/// Configuration roots cached for the daemon process's lifetime, computed
/// once at startup from the daemon's working directory ancestry.
#[derive(Debug, Clone, Default)]
pub struct ConfigRoots {
    roots: Vec<PathBuf>,
}

impl ConfigRoots {
    pub fn discover(start: &Path) -> Self {
        Self {
            roots: discover_roots(start),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// True when `path` is contained within one of the known roots, meaning
    /// a file write there should run without a permission prompt.
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

#[cfg(test)]
#[path = "config_roots_tests.rs"]
mod tests;
