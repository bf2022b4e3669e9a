// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural detection of the stale-conversation failure pattern.

/// Substrings the Model Runtime is known to use for "this resume token no
/// longer refers to a live conversation". Matching is case-insensitive and
/// deliberately loose: a false positive just costs one extra fresh-session
/// retry, a false negative surfaces the raw error to the user.
const STALE_PATTERNS: &[&str] = &[
    "no conversation found with session id",
    "no conversation found",
    "session not found",
    "unknown session id",
];

/// Whether a structured error's subtype/message text matches the
/// stale-conversation pattern closely enough to retry without a resume
/// token.
pub fn is_stale_resume_error(errors: &[String]) -> bool {
    errors.iter().any(|e| {
        let lower = e.to_lowercase();
        STALE_PATTERNS.iter().any(|pattern| lower.contains(pattern))
    })
}

#[cfg(test)]
#[path = "stale_resume_tests.rs"]
mod tests;
