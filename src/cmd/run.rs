// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `run` command: one invocation on a [`LocalDispatcher`].
//!
//! ```text
//! RunArgs --> Invocation (+ capture) --> ProcessTable::start
//!                                             |
//!                   LocalDispatcher::drain <--+--> exit watch
//!                             |                        |
//!                        echo output           completion (oneshot)
//!                                     \        /
//!                                     ProcessExit
//! ```

use std::io::Write as _;

use anyhow::Context;
use tokio::sync::oneshot;
use tracing::info;

use crate::cli::run::{CaptureMode, RunArgs};
use crate::config::Config;
use crate::core::event::{LocalDispatcher, ProcessExit};
use crate::core::file::{LocalFile, Usage};
use crate::core::process::{CapturedPipe, Invocation, ProcessTable, Streams};
use crate::error::{ProcessError, Result};

/// Builds the invocation described by `args` and its capture, if any.
///
/// # Errors
///
/// Returns a [`ProcessError`] if a file argument is missing or no pipe can
/// be allocated.
pub fn build_invocation(
    args: &RunArgs,
) -> std::result::Result<(Invocation, Option<CapturedPipe>), ProcessError> {
    let mut invocation = Invocation::new();
    let mut command = args.command.iter();

    if args.exact
        && let Some(program) = command.next()
    {
        invocation.add_file_arg(&LocalFile::new(program), Usage::Read)?;
    }
    invocation.add_args(command.cloned())?;
    for file in &args.files {
        invocation.add_file_arg(&LocalFile::new(file), Usage::Read)?;
    }

    let pipe = match args.capture {
        CaptureMode::None => None,
        CaptureMode::Stdout => Some(invocation.capture_stdout()?),
        CaptureMode::Stderr => Some(invocation.capture_stderr()?),
        CaptureMode::Combined => Some(invocation.capture_output()?),
    };

    Ok((invocation, pipe))
}

/// Runs the program and echoes its captured output.
///
/// Must be awaited inside a [`tokio::task::LocalSet`].
///
/// # Errors
///
/// Returns an error if the program cannot be started or the completion
/// never arrives.
pub async fn run_run_command(args: &RunArgs, config: &Config) -> Result<ProcessExit> {
    let dispatcher = LocalDispatcher::new(&config.process);
    let table = ProcessTable::new();

    let (invocation, pipe) = build_invocation(args)?;
    let name = invocation.display_name();
    let (tx, rx) = oneshot::channel();

    table
        .start(invocation, &dispatcher, move |exit| {
            let _ = tx.send(exit);
        })
        .with_context(|| format!("failed to start {name}"))?;

    if let Some(pipe) = pipe {
        let streams = pipe.streams();
        let output = dispatcher
            .drain(pipe)
            .await
            .context("pipe drain task failed")?;
        echo(streams, &output)?;
    }

    let exit = rx
        .await
        .with_context(|| format!("{name} never completed"))?;
    info!(process = %name, %exit, "finished");
    Ok(exit)
}

fn echo(streams: Streams, output: &[u8]) -> Result<()> {
    if streams == Streams::STDERR {
        std::io::stderr()
            .write_all(output)
            .context("failed to write captured stderr")
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(output)
            .and_then(|()| stdout.flush())
            .context("failed to write captured output")
    }
}
