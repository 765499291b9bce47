// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reading a captured pipe to end of stream.

use std::io;
use std::os::fd::OwnedFd;

use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tracing::trace;

/// Emits complete output lines as trace events.
#[derive(Debug)]
pub(super) struct LineForwarder {
    process: String,
    stream: &'static str,
    partial: Vec<u8>,
}

impl LineForwarder {
    pub(super) fn new(process: impl Into<String>, stream: &'static str) -> Self {
        Self {
            process: process.into(),
            stream,
            partial: Vec::new(),
        }
    }

    pub(super) fn push(&mut self, chunk: &[u8]) {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            self.emit();
            rest = &rest[pos + 1..];
        }
        self.partial.extend_from_slice(rest);
    }

    /// Emits a trailing line that had no newline.
    pub(super) fn finish(&mut self) {
        if !self.partial.is_empty() {
            self.emit();
        }
    }

    fn emit(&mut self) {
        let text = String::from_utf8_lossy(&self.partial);
        let line = text.strip_suffix('\r').unwrap_or(&text);
        trace!(process = %self.process, stream = self.stream, "{line}");
        self.partial.clear();
    }
}

/// Reads `read_end` until EOF, appending everything to `output`.
///
/// Bytes read before an error stay in `output`.
pub(super) async fn read_to_end(
    read_end: OwnedFd,
    chunk_size: usize,
    output: &mut Vec<u8>,
    mut forward: Option<&mut LineForwarder>,
) -> io::Result<()> {
    let mut receiver = pipe::Receiver::from_owned_fd(read_end)?;
    let mut chunk = vec![0_u8; chunk_size];

    loop {
        let n = receiver.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        output.extend_from_slice(&chunk[..n]);
        if let Some(forwarder) = forward.as_deref_mut() {
            forwarder.push(&chunk[..n]);
        }
    }

    if let Some(forwarder) = forward {
        forwarder.finish();
    }
    Ok(())
}
