// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes shared across the daemon and CLI.

use crate::define_id;

define_id! {
    /// Client-chosen identifier, expected unique per live client connection.
    pub struct ClientId;
}

define_id! {
    /// Request identifier chosen by the client, scoping one turn's event stream.
    pub struct RequestId;
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
