// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. kiln.toml (cwd, optional)
//! 3. --ini FILE (repeatable)
//! 4. KILN_* env vars
//! 5. --set overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! KILN_PROCESS__DRAIN_CHUNK_SIZE=4096  → process.drain_chunk_size = 4096
//! KILN_GLOBAL__OUTPUT_LOG_LEVEL=5      → global.output_log_level = 5
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

use loader::ConfigLoader;
pub use types::{GlobalConfig, ProcessConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Dispatcher and pipe drain settings.
    pub process: ProcessConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use kiln::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("kiln.toml")
    ///     .with_env_prefix("KILN")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML, does not match the
    /// `Config` structure, or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// # Errors
    ///
    /// Returns an error if a `[process]` value is out of range.
    pub fn resolve_and_validate(&mut self) -> Result<()> {
        self.process.validate()?;
        Ok(())
    }

    /// Configuration as sorted `key = value` lines.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        options.insert(
            "global.output_log_level",
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level",
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file",
            self.global
                .log_file
                .as_ref()
                .map_or_else(|| "(none)".to_string(), |p| p.display().to_string()),
        );
        options.insert(
            "process.exit_poll_interval_ms",
            self.process.exit_poll_interval_ms.to_string(),
        );
        options.insert(
            "process.drain_chunk_size",
            self.process.drain_chunk_size.to_string(),
        );
        options.insert(
            "process.forward_output_to_log",
            self.process.forward_output_to_log.to_string(),
        );

        let max_key_len = options.keys().map(|k| k.len()).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}
