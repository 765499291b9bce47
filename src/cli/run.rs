// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `run` command arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

/// Which child streams are captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CaptureMode {
    /// Child inherits stdout and stderr.
    None,
    /// Capture stdout only.
    Stdout,
    /// Capture stderr only.
    Stderr,
    /// Capture stdout and stderr on one pipe.
    #[default]
    Combined,
}

/// Arguments for `kiln run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Streams to capture and echo once drained.
    #[arg(short = 'c', long, value_enum, default_value_t = CaptureMode::Combined)]
    pub capture: CaptureMode,

    /// Appends an existing file as an argument after PROGRAM's own
    /// arguments. Can be specified multiple times.
    #[arg(short = 'f', long = "file", value_name = "PATH", action = clap::ArgAction::Append)]
    pub files: Vec<PathBuf>,

    /// Executes PROGRAM as an exact path instead of searching PATH.
    #[arg(long)]
    pub exact: bool,

    /// Program followed by its arguments.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "PROGRAM")]
    pub command: Vec<OsString>,
}
