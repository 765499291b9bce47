// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch (LocalSet)
//!   Run | Options | Inis | Version
//! ```

use std::process::ExitCode;

use kiln::cli::global::GlobalOptions;
use kiln::cli::{self, Command};
use kiln::cmd::config::{run_inis_command, run_options_command};
use kiln::cmd::run::run_run_command;
use kiln::config::Config;
use kiln::config::loader::ConfigLoader;
use kiln::logging::init_logging;
use kiln::logging::{LogConfig, LogLevel};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let log_config = build_log_config(&cli.global);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    tokio::task::LocalSet::new()
        .run_until(dispatch_command(&cli))
        .await
}

fn build_log_config(global: &GlobalOptions) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(LogLevel::INFO);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(console_level);

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(global.log_file.clone())
        .build()
}

async fn dispatch_command(cli: &cli::Cli) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Options) => load_config(&cli.global).map(|config| {
            run_options_command(&config);
            ExitCode::SUCCESS
        }),
        Some(Command::Inis) => build_config_loader(&cli.global).map(|loader| {
            run_inis_command(&loader.format_loaded_files());
            ExitCode::SUCCESS
        }),
        Some(Command::Run(args)) => match load_config(&cli.global) {
            Ok(config) => run_run_command(args, &config)
                .await
                .map(|exit| ExitCode::from(exit_status_byte(exit.shell_status()))),
            Err(e) => Err(e),
        },
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Exit statuses outside 0..=255 (the lost-child status) map to 255.
fn exit_status_byte(status: i32) -> u8 {
    u8::try_from(status).unwrap_or(u8::MAX)
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> kiln::error::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional("kiln.toml");
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader = loader.with_env_prefix("KILN");
    for option in global.to_config_overrides() {
        loader = loader.set_override(&option)?;
    }
    Ok(loader)
}

fn load_config(global: &GlobalOptions) -> kiln::error::Result<Config> {
    build_config_loader(global)?.build().map_err(|e| {
        eprintln!("Failed to load config: {e}");
        e
    })
}
