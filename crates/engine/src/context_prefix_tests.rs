// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).single().expect("valid timestamp")
}

#[test]
fn no_switch_note_on_first_turn() {
    let (prefix, note) = compose(fixed_time(), None, Some("A"));
    assert!(prefix.contains("2026-07-28"));
    assert!(note.is_none());
}

#[test]
fn no_switch_note_when_session_is_unchanged() {
    let (_, note) = compose(fixed_time(), Some("A"), Some("A"));
    assert!(note.is_none());
}

#[test]
fn switch_note_matches_spec_wording() {
    let (prefix, note) = compose(fixed_time(), Some("A"), Some("B"));
    assert_eq!(note.as_deref(), Some("session switched: A -> B"));
    assert!(prefix.contains("moved from session \"A\" to session \"B\""));
}
