// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! kiln [global options] <command>
//! run [--capture MODE] [--file PATH]... -- PROGRAM [ARGS...]
//! options
//! inis
//! version
//! ```

pub mod global;
pub mod run;


use crate::cli::global::GlobalOptions;
use crate::cli::run::RunArgs;
use clap::{Parser, Subcommand};

/// Process and ownership core of a build tool.
#[derive(Debug, Parser)]
#[command(
    name = "kiln",
    author,
    version,
    about = "Build tool process runner",
    long_about = "kiln Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Runs external programs the way the build core does: pipes for\n\
                  captured output, completion once the program exited and every\n\
                  pipe was drained. See `kiln <command> --help` for details.",
    after_help = "CONFIG FILES:\n\n\
                  kiln loads `kiln.toml` from the current directory if present,\n\
                  then every file given with --ini, in order. KILN_* environment\n\
                  variables and --set options override the files."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the config files that were loaded.
    Inis,

    /// Runs a program and waits for it and its captured output.
    Run(RunArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
