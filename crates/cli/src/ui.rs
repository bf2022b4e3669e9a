// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI Client Session: the per-pane terminal frontend.
//! Connects, registers, replays history within a bounded handshake window,
//! renders streamed turn events as a simple transcript, and forwards local
//! input — parsing a small set of `/`-prefixed commands locally rather than
//! round-tripping them through the daemon.

use std::io::Write;

use jj_core::{ClientId, HistoryRole, IdGen, ModelAlias, RequestId, UuidIdGen};
use jj_daemon::codec::{ClientFrame, ServerFrame};
use jj_daemon::Paths;
use thiserror::Error;

use crate::color;
use crate::protocol::Connection;
use crate::ui_input::{self, InputEvent};

#[derive(Debug, Error)]
pub enum UiError {
    #[error("could not connect to the daemon at {path}: {source}")]
    Connect {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("daemon did not complete the registration handshake within the timeout")]
    HandshakeTimeout,
    #[error("daemon closed the connection during the registration handshake")]
    HandshakeClosed,
    #[error("daemon sent an unexpected frame during the registration handshake")]
    HandshakeUnexpected,
}

/// Run the UI client to completion: connect, register, replay history, then
/// loop rendering server events and forwarding local input until the
/// connection closes. There is no explicit "exit" in v1 — the
/// pane is hidden and re-shown externally — so the only way out is a closed
/// connection or Ctrl-D.
pub async fn run(paths: &Paths, session_tag: Option<String>) -> Result<(), UiError> {
    let mut conn = Connection::connect(&paths.socket_path)
        .await
        .map_err(|source| UiError::Connect {
            path: paths.socket_path.clone(),
            source,
        })?;

    let id_gen = UuidIdGen;
    let client_id = ClientId::new(id_gen.next());

    let register = ClientFrame::RegisterClient {
        client_id: client_id.clone(),
        zellij_session: session_tag.clone(),
        zellij_env: None,
        cwd: std::env::current_dir()
            .ok()
            .map(|p| p.to_string_lossy().into_owned()),
        hostname: nix::unistd::gethostname()
            .ok()
            .and_then(|s| s.into_string().ok()),
        pid: Some(std::process::id()),
    };

    // A malformed send here is an I/O failure on a connection we just
    // opened; treat it the same as never connecting.
    conn.send(&register)
        .await
        .map_err(|_| UiError::HandshakeClosed)?;

    let mut model = handshake(&mut conn).await?;

    let mut in_flight: Option<RequestId> = None;
    let mut input_rx = ui_input::spawn();

    loop {
        tokio::select! {
            frame = conn.recv() => {
                match frame {
                    Ok(Some(frame)) => {
                        if render(frame, &mut model) == TurnEnded::Yes {
                            in_flight = None;
                        }
                    }
                    Ok(None) => {
                        println!();
                        println!("{}", color::muted("daemon closed the connection"));
                        return Ok(());
                    }
                    Err(err) => {
                        println!("{}", color::muted(&format!("connection error: {err}")));
                        return Ok(());
                    }
                }
            }
            input = input_rx.recv() => {
                match input {
                    Some(InputEvent::Line(line)) => {
                        if !handle_input(
                            &line,
                            &mut conn,
                            &client_id,
                            &id_gen,
                            session_tag.as_deref(),
                            model,
                            &mut in_flight,
                        ).await {
                            return Ok(());
                        }
                    }
                    Some(InputEvent::Interrupted) => {
                        println!();
                        println!("{}", color::muted("(press Ctrl-D or use the hotkey to hide this pane)"));
                    }
                    Some(InputEvent::Eof) | None => return Ok(()),
                }
            }
        }
    }
}

/// Wait for `registered` then `history_snapshot`, in that order, within
/// [`crate::env::handshake_timeout`]. Any other frame, a
/// closed connection, or a timeout is a hard failure: the caller prints an
/// actionable message and exits nonzero.
async fn handshake(conn: &mut Connection) -> Result<ModelAlias, UiError> {
    let outcome = tokio::time::timeout(crate::env::handshake_timeout(), async {
        let registered = match conn.recv().await {
            Ok(Some(ServerFrame::Registered { model, busy, daemon_pid, .. })) => {
                println!(
                    "{}",
                    color::header(&format!(
                        "connected to jelly-j daemon (pid {daemon_pid}, model {model}{})",
                        if busy { ", busy" } else { "" }
                    ))
                );
                model
            }
            Ok(Some(_)) => return Err(UiError::HandshakeUnexpected),
            Ok(None) => return Err(UiError::HandshakeClosed),
            Err(_) => return Err(UiError::HandshakeClosed),
        };

        match conn.recv().await {
            Ok(Some(ServerFrame::HistorySnapshot { entries })) => {
                for entry in entries {
                    print_history_entry(&entry);
                }
                Ok(registered)
            }
            Ok(Some(_)) => Err(UiError::HandshakeUnexpected),
            Ok(None) => Err(UiError::HandshakeClosed),
            Err(_) => Err(UiError::HandshakeClosed),
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(UiError::HandshakeTimeout),
    }
}

fn print_history_entry(entry: &jj_core::HistoryEntry) {
    let label = match entry.role {
        HistoryRole::User => "you",
        HistoryRole::Assistant => "assistant",
        HistoryRole::Note => "note",
        HistoryRole::Error => "error",
    };
    println!("{} {}", color::muted(&format!("[{label}]")), entry.text);
}

#[derive(PartialEq, Eq)]
enum TurnEnded {
    Yes,
    No,
}

/// Render one incoming server frame to the transcript.
fn render(frame: ServerFrame, model: &mut ModelAlias) -> TurnEnded {
    match frame {
        ServerFrame::Registered { .. } | ServerFrame::HistorySnapshot { .. } => TurnEnded::No,
        ServerFrame::StatusNote { message } => {
            println!("{}", color::muted(&format!("-- {message}")));
            TurnEnded::No
        }
        ServerFrame::ChatStart { model: turn_model, queued_ahead, .. } => {
            if queued_ahead > 0 {
                println!(
                    "{}",
                    color::muted(&format!("-- queued behind {queued_ahead} other turn(s)"))
                );
            }
            print!("{} ", color::header(&format!("[{turn_model}]")));
            let _ = std::io::stdout().flush();
            TurnEnded::No
        }
        ServerFrame::ChatDelta { text, .. } => {
            print!("{text}");
            let _ = std::io::stdout().flush();
            TurnEnded::No
        }
        ServerFrame::ToolUse { name, .. } => {
            println!();
            println!("{}", color::muted(&format!("-- using tool: {name}")));
            TurnEnded::No
        }
        ServerFrame::ResultError { subtype, errors, .. } => {
            println!();
            println!(
                "{}",
                color::muted(&format!("-- error ({subtype}): {}", errors.join("; ")))
            );
            TurnEnded::No
        }
        ServerFrame::ChatEnd { ok, .. } => {
            println!();
            if !ok {
                println!("{}", color::muted("-- turn ended with an error"));
            }
            TurnEnded::Yes
        }
        ServerFrame::ModelUpdated { alias, .. } => {
            *model = alias;
            println!("{}", color::muted(&format!("-- model set to {alias}")));
            TurnEnded::No
        }
        ServerFrame::Pong { .. } => TurnEnded::No,
        ServerFrame::Error { message, .. } => {
            println!("{}", color::muted(&format!("-- error: {message}")));
            TurnEnded::No
        }
    }
}

/// Handle one line of local input. Returns `false` when the UI should exit
/// (currently: never — explicit exit is disabled — but the return type
/// leaves room for a future local-only exit path).
#[allow(clippy::too_many_arguments)]
async fn handle_input(
    line: &str,
    conn: &mut Connection,
    client_id: &ClientId,
    id_gen: &UuidIdGen,
    session_tag: Option<&str>,
    model: ModelAlias,
    in_flight: &mut Option<RequestId>,
) -> bool {
    if line.is_empty() {
        return true;
    }

    if matches!(line, "exit" | "quit" | "bye" | "q") {
        println!(
            "{}",
            color::muted(
                "explicit exit is disabled here; hide this pane with the hotkey, the daemon is managed separately"
            )
        );
        return true;
    }

    if let Some(rest) = line.strip_prefix('/') {
        handle_slash_command(rest.trim(), conn, client_id, id_gen, session_tag, model).await;
        return true;
    }

    if in_flight.is_some() {
        println!(
            "{}",
            color::muted("-- a turn is already in flight; wait for it to finish")
        );
        return true;
    }

    let request_id = RequestId::new(id_gen.next());
    let frame = ClientFrame::ChatRequest {
        request_id: request_id.clone(),
        client_id: client_id.clone(),
        text: line.to_string(),
        zellij_session: session_tag.map(str::to_string),
        zellij_env: None,
    };
    if conn.send(&frame).await.is_err() {
        println!("{}", color::muted("-- failed to send: connection lost"));
        return false;
    }
    *in_flight = Some(request_id);
    true
}

async fn handle_slash_command(
    command: &str,
    conn: &mut Connection,
    client_id: &ClientId,
    id_gen: &UuidIdGen,
    session_tag: Option<&str>,
    model: ModelAlias,
) {
    let mut parts = command.splitn(2, char::is_whitespace);
    match parts.next().unwrap_or("") {
        "model" => match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                let available = ModelAlias::ALL
                    .iter()
                    .map(ModelAlias::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{}",
                    color::muted(&format!("current model: {model} (available: {available})"))
                );
            }
            Some(alias_str) => match alias_str.parse::<ModelAlias>() {
                Ok(alias) if alias == model => {
                    println!("{}", color::muted(&format!("model is already {model}")));
                }
                Ok(alias) => {
                    let request_id = RequestId::new(id_gen.next());
                    let frame = ClientFrame::SetModel {
                        request_id,
                        client_id: client_id.clone(),
                        alias,
                    };
                    let _ = conn.send(&frame).await;
                }
                Err(err) => println!("{}", color::muted(&format!("-- {err}"))),
            },
        },
        "new" => {
            let request_id = RequestId::new(id_gen.next());
            let frame = ClientFrame::NewSession {
                request_id,
                client_id: client_id.clone(),
                zellij_session: session_tag.map(str::to_string),
            };
            let _ = conn.send(&frame).await;
        }
        other => {
            println!(
                "{}",
                color::muted(&format!(
                    "-- unknown command '/{other}'; available: /model [alias], /new"
                ))
            );
        }
    }
}
