// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composes the one-turn context prefix the Executor passes to the Model
//! Runtime Adapter alongside the user's text.

use chrono::{DateTime, Utc};

/// Build the context prefix: current wall-clock/timezone, plus (when the
/// request's session tag differs from the last observed one) a plain
/// statement that the user moved sessions.
///
/// Returns the composed prefix and, when a session switch was detected, the
/// `status_note` message to emit before `chat_start`.
pub fn compose(
    now: DateTime<Utc>,
    last_session: Option<&str>,
    request_session: Option<&str>,
) -> (String, Option<String>) {
    let mut prefix = format!(
        "Current time: {} (UTC).",
        now.format("%Y-%m-%d %H:%M:%S")
    );

    let switch_note = match (last_session, request_session) {
        (Some(last), Some(next)) if last != next => {
            let note = format!("session switched: {last} -> {next}");
            prefix.push_str(&format!(
                "\nThe user has moved from session \"{last}\" to session \"{next}\"; \
                 workspace state may differ from the last turn."
            ));
            Some(note)
        }
        _ => None,
    };

    (prefix, switch_note)
}

#[cfg(test)]
#[path = "context_prefix_tests.rs"]
mod tests;
