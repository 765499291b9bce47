// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!   anyhow::Result        cli / cmd / main
//!         ^
//!         |  ?
//!   ConfigError   InvalidValue, ParseError
//!   ProcessError  NoArguments, AlreadyStarted, InvalidArgument,
//!                 PipeFailed, ForkFailed(errno), File
//!   FileError     NotFound, Materialize, Io
//! ```
//!
//! Empty-handle dereferences and out-of-range container indices are not
//! errors; they panic.

use nix::errno::Errno;
use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse config '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Process Errors ---

/// Errors raised while configuring or starting a process invocation.
///
/// Once a child is running, failures surface only through its terminal
/// state; there is no error channel after `start` returns.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// `start` was called with an empty argument list.
    #[error("no program given")]
    NoArguments,

    /// The invocation was already started.
    #[error("process '{command}' was already started")]
    AlreadyStarted { command: String },

    /// An argument cannot be passed to exec.
    #[error("argument contains an interior NUL byte: {arg:?}")]
    InvalidArgument { arg: String },

    /// Pipe allocation failed.
    #[error("failed to allocate pipe: {source}")]
    PipeFailed {
        #[source]
        source: Errno,
    },

    /// Process creation failed.
    #[error("failed to fork for '{command}': {source}")]
    ForkFailed {
        command: String,
        #[source]
        source: Errno,
    },

    /// A file-backed argument could not be resolved.
    #[error(transparent)]
    File(#[from] FileError),
}

impl ProcessError {
    /// Raw OS error code, for the variants that carry one.
    #[must_use]
    pub const fn os_error(&self) -> Option<i32> {
        match self {
            Self::PipeFailed { source } | Self::ForkFailed { source, .. } => Some(*source as i32),
            _ => None,
        }
    }
}

// --- File Errors ---

/// Errors resolving a logical file to an on-disk path.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file must exist for the requested usage but does not.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// In-memory content could not be written to a temporary file.
    #[error("failed to materialize '{name}' on disk: {source}")]
    Materialize {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
