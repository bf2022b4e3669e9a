// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CLI side of the Wire Protocol & Codec: a persistent
//! streaming connection over the daemon's Unix socket. Reuses
//! [`jj_daemon::codec`]'s newline-delimited JSON framing directly rather
//! than reimplementing it — the daemon writes [`ClientFrame`]s and reads
//! [`ServerFrame`]s, the CLI does the mirror image of both.

use std::path::Path;

use jj_daemon::codec::{read_frame, write_frame, ClientFrame, ProtocolError, ServerFrame};
use tokio::io::BufReader;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

/// A connected socket, split into independently-owned read and write
/// halves so a caller can drive a read loop and write requests
/// concurrently.
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    max_frame_bytes: usize,
}

impl Connection {
    pub async fn connect(socket_path: &Path) -> std::io::Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            max_frame_bytes: jj_daemon::env::max_frame_bytes(),
        })
    }

    pub async fn send(&mut self, frame: &ClientFrame) -> Result<(), ProtocolError> {
        write_frame(&mut self.writer, frame).await
    }

    /// Read the next server frame, or `Ok(None)` if the daemon closed the
    /// connection.
    pub async fn recv(&mut self) -> Result<Option<ServerFrame>, ProtocolError> {
        read_frame(&mut self.reader, self.max_frame_bytes).await
    }

    pub fn into_split(self) -> (BufReader<OwnedReadHalf>, OwnedWriteHalf) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
