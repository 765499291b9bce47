// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! [global]   output_log_level, file_log_level, log_file
//! [process]  exit_poll_interval_ms, drain_chunk_size, forward_output_to_log
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Global options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Console log level (0-6).
    pub output_log_level: LogLevel,
    /// File log level (0-6).
    pub file_log_level: LogLevel,
    /// Log file; no file logging when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
        }
    }
}

/// Settings for the process dispatcher and pipe drains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessConfig {
    /// Upper bound between exit checks when no `SIGCHLD` arrives.
    pub exit_poll_interval_ms: u64,
    /// Read buffer size for draining captured pipes.
    pub drain_chunk_size: usize,
    /// Emit every drained output line as a trace event.
    pub forward_output_to_log: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            exit_poll_interval_ms: 100,
            drain_chunk_size: 8192,
            forward_output_to_log: false,
        }
    }
}

impl ProcessConfig {
    #[must_use]
    pub const fn exit_poll_interval(&self) -> Duration {
        Duration::from_millis(self.exit_poll_interval_ms)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero poll interval or
    /// chunk size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exit_poll_interval_ms == 0 {
            return Err(invalid("exit_poll_interval_ms", "must be greater than zero"));
        }
        if self.drain_chunk_size == 0 {
            return Err(invalid("drain_chunk_size", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: "process".to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
