//! Shared test harness for the black-box specs: a compiled `jelly-j` binary,
//! a scriptable fake model runtime standing in for the real one, and a thin
//! async client that speaks the wire protocol directly over a Unix socket.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::time::Duration;

use jj_core::{ClientId, RequestId};
use jj_daemon::codec::{ClientFrame, ProtocolError, ServerFrame};
use jj_daemon::Paths;
use tokio::io::BufReader;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

pub const READY_TIMEOUT_MS: u64 = 5_000;
pub const FRAME_TIMEOUT_MS: u64 = 5_000;

/// A resume token no live conversation will ever hold, recognized by
/// [`FakeRuntime`]'s script as the trigger for a stale-resume failure.
pub const STALE_RESUME_TOKEN: &str = "00000000-0000-0000-0000-000000000000";

/// A marker the test prompt can embed to make the fake runtime sleep before
/// replying, so a turn stays in flight long enough for a second request to
/// observe it queued.
pub fn delay_marker(ms: u64) -> String {
    format!("SPEC_DELAY_MS:{ms}")
}

/// A scriptable stand-in for the real model runtime subprocess, reachable
/// via `JELLY_J_MODEL_RUNTIME_BIN`. Understands the same `stream-json`
/// event shapes the real adapter parses (`system`/`init`, `assistant`,
/// `result`), so the Executor's retry and history logic exercise the same
/// code paths they do against the real thing.
pub struct FakeRuntime {
    _dir: tempfile::TempDir,
    bin: PathBuf,
}

impl FakeRuntime {
    pub fn install() -> Self {
        let dir = tempfile::tempdir().expect("fake runtime tempdir");
        let bin = dir.path().join("fake-model-runtime");
        std::fs::write(&bin, FAKE_RUNTIME_SCRIPT).expect("write fake runtime script");
        let mut perms = std::fs::metadata(&bin).expect("script metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&bin, perms).expect("chmod script");
        Self { _dir: dir, bin }
    }

    pub fn bin_path(&self) -> &Path {
        &self.bin
    }
}

const FAKE_RUNTIME_SCRIPT: &str = r#"#!/usr/bin/env bash
set -euo pipefail

prompt="$1"
shift

resume=""
while [[ $# -gt 0 ]]; do
  case "$1" in
    --resume)
      resume="$2"
      shift 2
      ;;
    *)
      shift
      ;;
  esac
done

if [[ "$resume" == "00000000-0000-0000-0000-000000000000" ]]; then
  echo '{"type":"result","subtype":"error_during_execution","errors":["No conversation found with session ID 00000000-0000-0000-0000-000000000000"]}'
  exit 0
fi

if [[ "$prompt" =~ SPEC_DELAY_MS:([0-9]+) ]]; then
  ms="${BASH_REMATCH[1]}"
  sleep "$(awk "BEGIN { print $ms / 1000 }")"
fi

session_id="$(cat /proc/sys/kernel/random/uuid 2>/dev/null || echo 11111111-1111-1111-1111-111111111111)-$$"
printf '{"type":"system","subtype":"init","session_id":"%s"}\n' "$session_id"

reply="hello from the fake model runtime"
if [[ "$prompt" == *"reply with exactly: ok"* ]]; then
  reply="ok"
fi

printf '{"type":"assistant","message":{"content":[{"type":"text","text":"%s"}]}}\n' "$reply"
echo '{"type":"result","subtype":"success"}'
"#;

/// A `jelly-j daemon` subprocess bound to an isolated state directory, with
/// the fake model runtime standing in for the real one.
pub struct TestDaemon {
    child: Child,
    paths: Paths,
    _state_dir: tempfile::TempDir,
    _runtime: FakeRuntime,
}

impl TestDaemon {
    /// Spawn the daemon and wait for its socket to accept connections.
    pub async fn spawn() -> Self {
        Self::spawn_with_seed_state(None).await
    }

    /// Spawn the daemon against a state directory pre-seeded with the given
    /// `state.json` contents, for specs that need to control the resume
    /// token or model alias the daemon starts with.
    pub async fn spawn_with_seed_state(seed_state: Option<&jj_core::ConversationState>) -> Self {
        let state_dir = tempfile::tempdir().expect("state dir");
        let runtime = FakeRuntime::install();
        let paths = Paths::under(state_dir.path().to_path_buf());

        if let Some(state) = seed_state {
            let contents = serde_json::to_string(state).expect("serialize seed state");
            std::fs::write(&paths.state_path, contents).expect("write seed state.json");
        }

        let child = std::process::Command::new(jelly_j_bin())
            .arg("daemon")
            .env("JELLY_J_STATE_DIR", state_dir.path())
            .env("JELLY_J_MODEL_RUNTIME_BIN", runtime.bin_path())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .expect("spawn jelly-j daemon");

        let daemon = Self {
            child,
            paths,
            _state_dir: state_dir,
            _runtime: runtime,
        };
        daemon.wait_ready().await;
        daemon
    }

    async fn wait_ready(&self) {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(READY_TIMEOUT_MS);
        while tokio::time::Instant::now() < deadline {
            if self.paths.socket_path.exists() && UnixStream::connect(&self.paths.socket_path).await.is_ok()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("daemon did not become ready within the startup timeout");
    }

    pub fn socket_path(&self) -> &Path {
        &self.paths.socket_path
    }

    pub fn state_path(&self) -> &Path {
        &self.paths.state_path
    }

    pub fn history_path(&self) -> &Path {
        &self.paths.history_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.paths.lock_path
    }

    pub fn state_dir(&self) -> &Path {
        &self.paths.state_dir
    }

    /// Connect a fresh client and complete the `register_client` handshake.
    pub async fn connect(&self, client_id: &str) -> TestClient {
        let mut client = TestClient::connect(self.socket_path()).await;
        client.register(client_id).await;
        client
    }

    /// Connect without registering, for protocol-error specs.
    pub async fn connect_raw(&self) -> TestClient {
        TestClient::connect(self.socket_path()).await
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A second `jelly-j daemon` pointed at an already-owned state directory,
/// for the singleton race scenario. Does not wait for readiness: the point
/// of the test is to observe it lose the race.
pub fn spawn_daemon_at(state_dir: &Path, runtime_bin: &Path) -> Child {
    std::process::Command::new(jelly_j_bin())
        .arg("daemon")
        .env("JELLY_J_STATE_DIR", state_dir)
        .env("JELLY_J_MODEL_RUNTIME_BIN", runtime_bin)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .expect("spawn second jelly-j daemon")
}

pub fn jelly_j_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("jelly-j")
}

/// A connected, raw wire-protocol client: the test-side mirror of
/// `jj-cli`'s own connection helper, speaking [`ClientFrame`]/[`ServerFrame`]
/// directly so specs can assert on exact frame sequences.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(socket_path: &Path) -> Self {
        let stream = UnixStream::connect(socket_path)
            .await
            .expect("connect to daemon socket");
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    pub async fn send(&mut self, frame: &ClientFrame) {
        jj_daemon::codec::write_frame(&mut self.writer, frame)
            .await
            .expect("write frame");
    }

    pub async fn recv(&mut self) -> Option<ServerFrame> {
        self.try_recv()
            .await
            .expect("read frame")
    }

    async fn try_recv(&mut self) -> Result<Option<ServerFrame>, ProtocolError> {
        jj_daemon::codec::read_frame(&mut self.reader, 1024 * 1024).await
    }

    /// `recv`, bounded by [`FRAME_TIMEOUT_MS`] so a spec hangs for seconds,
    /// not forever, when an expected frame never arrives.
    pub async fn recv_timeout(&mut self) -> Option<ServerFrame> {
        tokio::time::timeout(Duration::from_millis(FRAME_TIMEOUT_MS), self.recv())
            .await
            .expect("frame arrived before the test timeout")
    }

    /// Send `register_client` and consume the `registered` +
    /// `history_snapshot` handshake pair.
    pub async fn register(&mut self, client_id: &str) -> (ServerFrame, ServerFrame) {
        self.send(&ClientFrame::RegisterClient {
            client_id: ClientId::new(client_id),
            zellij_session: None,
            zellij_env: None,
            cwd: None,
            hostname: None,
            pid: None,
        })
        .await;
        let registered = self.recv_timeout().await.expect("registered frame");
        let snapshot = self.recv_timeout().await.expect("history_snapshot frame");
        (registered, snapshot)
    }

    pub async fn chat(&mut self, request_id: &str, client_id: &str, text: impl Into<String>) {
        self.send(&ClientFrame::ChatRequest {
            request_id: RequestId::new(request_id),
            client_id: ClientId::new(client_id),
            text: text.into(),
            zellij_session: None,
            zellij_env: None,
        })
        .await;
    }

    pub async fn chat_in_session(
        &mut self,
        request_id: &str,
        client_id: &str,
        text: impl Into<String>,
        session: impl Into<String>,
    ) {
        self.send(&ClientFrame::ChatRequest {
            request_id: RequestId::new(request_id),
            client_id: ClientId::new(client_id),
            text: text.into(),
            zellij_session: Some(session.into()),
            zellij_env: None,
        })
        .await;
    }

    /// Drain frames until `chat_end` for `request_id` is seen, returning
    /// every frame observed (including the `chat_end` itself).
    pub async fn drain_turn(&mut self, request_id: &str) -> Vec<ServerFrame> {
        let mut frames = Vec::new();
        loop {
            let frame = self.recv_timeout().await.expect("frame during turn");
            let is_end = matches!(
                &frame,
                ServerFrame::ChatEnd { request_id: rid, .. } if rid.as_str() == request_id
            );
            frames.push(frame);
            if is_end {
                return frames;
            }
        }
    }
}

pub fn read_history_lines(path: &Path) -> Vec<jj_core::HistoryEntry> {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    contents
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

pub async fn wait_for_async<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Build a `jelly-j` CLI invocation with piped output, for specs that never
/// involve a daemon at all (help, version, unknown-subcommand errors).
pub fn jelly_j() -> std::process::Command {
    std::process::Command::new(jelly_j_bin())
}

pub fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
