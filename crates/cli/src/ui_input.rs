// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A rustyline editor running on its own OS thread, forwarding completed
//! lines to the async UI loop over a channel. `rustyline::Editor::readline`
//! blocks the calling thread, so it cannot run directly on the Tokio
//! executor alongside the socket read loop.

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, EditMode, Editor};
use tokio::sync::mpsc;

/// One outcome of a readline call, forwarded to the UI loop.
pub enum InputEvent {
    /// A non-empty, trimmed line of user input.
    Line(String),
    /// Ctrl-C: re-prompts rather than exiting.
    Interrupted,
    /// Ctrl-D / EOF on stdin.
    Eof,
}

/// Spawn the input thread and return the receiving half of its channel.
/// The sender is dropped (ending the channel) when the thread itself exits,
/// which only happens on EOF or an unrecoverable terminal error.
pub fn spawn() -> mpsc::UnboundedReceiver<InputEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || input_loop(tx));
    rx
}

fn input_loop(tx: mpsc::UnboundedSender<InputEvent>) {
    let config = Config::builder()
        .history_ignore_dups(true)
        .unwrap_or_default()
        .edit_mode(EditMode::Emacs)
        .auto_add_history(true)
        .build();

    let mut editor: Editor<(), DefaultHistory> = match Editor::with_config(config) {
        Ok(editor) => editor,
        Err(_) => return,
    };

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim().to_string();
                if tx.send(InputEvent::Line(trimmed)).is_err() {
                    return;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if tx.send(InputEvent::Interrupted).is_err() {
                    return;
                }
            }
            Err(ReadlineError::Eof) => {
                let _ = tx.send(InputEvent::Eof);
                return;
            }
            Err(_) => {
                let _ = tx.send(InputEvent::Eof);
                return;
            }
        }
    }
}
