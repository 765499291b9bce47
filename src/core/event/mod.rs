// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event dispatch contract for process exit notifications.
//!
//! ```text
//! Invocation::start
//!     |
//!     v
//! Dispatcher::on_process_exit(pid, callback) --> ExitWatch
//!     |                                            |
//!     | child terminates                           | cancel()
//!     v                                            v
//! callback(ProcessExit::Exited(code))        callback never runs
//!      or (ProcessExit::Signaled(signo))
//! ```
//!
//! Every callback runs on the dispatcher's single thread. A callback is
//! invoked at most once, and never after its watch was cancelled.
//!
//! [`LocalDispatcher`] implements the contract on a tokio current-thread
//! runtime and also drains captured pipes.

mod drain;
mod local;


use std::fmt;

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use tokio_util::sync::CancellationToken;

pub use local::LocalDispatcher;

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Normal exit with a status code.
    Exited(i32),
    /// Terminated by a signal.
    Signaled(i32),
}

impl ProcessExit {
    /// Terminal outcome of a wait status; `None` for stop/continue reports
    /// and `StillAlive`.
    #[must_use]
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Self::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(Self::Signaled(signal as i32)),
            _ => None,
        }
    }

    /// Exit code, if the process exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(code),
            Self::Signaled(_) => None,
        }
    }

    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Shell convention: the exit code, or 128 plus the signal number.
    #[must_use]
    pub const fn shell_status(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal,
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(signal) => write!(f, "killed by signal {signal}"),
        }
    }
}

/// Callback handed to [`Dispatcher::on_process_exit`].
pub type ExitCallback = Box<dyn FnOnce(ProcessExit)>;

/// Cancellation handle for a registered exit watch.
///
/// Cloning shares the same watch. Dropping a handle does not cancel it.
#[derive(Debug, Clone, Default)]
pub struct ExitWatch {
    token: CancellationToken,
}

impl ExitWatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the callback if it has not run yet.
    ///
    /// Cancelling does not reap the child; whoever cancels must wait on it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that completes when the watch is cancelled.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Source of process exit notifications.
pub trait Dispatcher {
    /// Registers `callback` to run once when `pid` terminates.
    ///
    /// The dispatcher reaps the child before invoking the callback.
    fn on_process_exit(&self, pid: Pid, callback: ExitCallback) -> ExitWatch;
}
