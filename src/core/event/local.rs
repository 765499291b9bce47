// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Single-threaded dispatcher on a tokio `LocalSet`.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::drain::{LineForwarder, read_to_end};
use super::{Dispatcher, ExitCallback, ExitWatch, ProcessExit};
use crate::config::ProcessConfig;
use crate::core::process::CapturedPipe;

/// Status reported when the child vanished without being reaped by us.
const LOST_CHILD_STATUS: i32 = -1;

/// Dispatcher whose watches and drains are tasks on the current `LocalSet`.
///
/// Exit watches wake on `SIGCHLD` and fall back to polling at the
/// configured interval. Both [`Dispatcher::on_process_exit`] and
/// [`LocalDispatcher::drain`] must be called from inside a
/// [`tokio::task::LocalSet`].
#[derive(Debug, Clone)]
pub struct LocalDispatcher {
    poll_interval: Duration,
    chunk_size: usize,
    forward_output: bool,
}

impl Default for LocalDispatcher {
    fn default() -> Self {
        Self::new(&ProcessConfig::default())
    }
}

impl LocalDispatcher {
    #[must_use]
    pub fn new(config: &ProcessConfig) -> Self {
        Self {
            poll_interval: config.exit_poll_interval(),
            chunk_size: config.drain_chunk_size.max(1),
            forward_output: config.forward_output_to_log,
        }
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Reads `pipe` to EOF on a local task, then reports it drained.
    ///
    /// The task resolves to every byte read. A read error ends the drain
    /// early; the pipe still counts as drained.
    pub fn drain(&self, pipe: CapturedPipe) -> JoinHandle<Vec<u8>> {
        let chunk_size = self.chunk_size;
        let forward_output = self.forward_output;

        tokio::task::spawn_local(async move {
            let (read_end, token) = pipe.into_parts();
            let stream = token.streams().label();
            let mut forwarder =
                forward_output.then(|| LineForwarder::new(token.process_name(), stream));

            let mut output = Vec::new();
            if let Err(e) = read_to_end(read_end, chunk_size, &mut output, forwarder.as_mut()).await
            {
                warn!(stream, error = %e, "error reading captured pipe");
            }
            trace!(stream, bytes = output.len(), "pipe drained");

            token.finish();
            output
        })
    }
}

impl Dispatcher for LocalDispatcher {
    fn on_process_exit(&self, pid: Pid, callback: ExitCallback) -> ExitWatch {
        let watch = ExitWatch::new();
        let token = watch.token();
        let poll_interval = self.poll_interval;

        tokio::task::spawn_local(async move {
            let mut sigchld = match signal(SignalKind::child()) {
                Ok(sigchld) => Some(sigchld),
                Err(e) => {
                    debug!(error = %e, "no SIGCHLD stream, polling only");
                    None
                }
            };

            let exit = loop {
                if token.is_cancelled() {
                    trace!(%pid, "exit watch cancelled");
                    return;
                }

                match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                    Ok(WaitStatus::StillAlive) => {}
                    Ok(status) => {
                        if let Some(exit) = ProcessExit::from_wait_status(status) {
                            break exit;
                        }
                    }
                    Err(Errno::EINTR) => continue,
                    Err(errno) => {
                        error!(%pid, %errno, "cannot wait for child");
                        break ProcessExit::Exited(LOST_CHILD_STATUS);
                    }
                }

                tokio::select! {
                    () = token.cancelled() => {}
                    () = child_signal(&mut sigchld) => {}
                    () = tokio::time::sleep(poll_interval) => {}
                }
            };

            trace!(%pid, %exit, "reaped");
            callback(exit);
        });

        watch
    }
}

/// Resolves on the next `SIGCHLD`; never resolves without a stream.
async fn child_signal(sigchld: &mut Option<Signal>) {
    if let Some(stream) = sigchld
        && stream.recv().await.is_some()
    {
        return;
    }
    std::future::pending::<()>().await;
}
