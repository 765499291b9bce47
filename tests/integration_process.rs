// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for process invocations on the local dispatcher.
//!
//! Each test runs inside a `LocalSet`, the way the binary drives
//! invocations.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use kiln::config::ProcessConfig;
use kiln::core::event::{LocalDispatcher, ProcessExit};
use kiln::core::file::{ContentFile, Usage};
use kiln::core::process::{EXEC_FAILURE_STATUS, Invocation, InvocationState, ProcessTable};
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, waitpid};
use tokio::sync::oneshot;
use tokio::task::LocalSet;

fn dispatcher() -> LocalDispatcher {
    LocalDispatcher::new(&ProcessConfig {
        exit_poll_interval_ms: 10,
        ..ProcessConfig::default()
    })
}

fn sh(script: &str) -> Invocation {
    let mut invocation = Invocation::new();
    invocation.add_args(["sh", "-c", script]).unwrap();
    invocation
}

async fn local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

fn completion() -> (
    impl FnOnce(ProcessExit) + 'static,
    oneshot::Receiver<ProcessExit>,
) {
    let (tx, rx) = oneshot::channel();
    (
        move |exit| {
            let _ = tx.send(exit);
        },
        rx,
    )
}

#[tokio::test]
async fn exit_zero_without_capture() {
    local(async {
        let dispatcher = dispatcher();
        let (on_complete, rx) = completion();
        let mut invocation = sh("exit 0");

        invocation.start(&dispatcher, on_complete).unwrap();
        assert_eq!(rx.await.unwrap(), ProcessExit::Exited(0));
        assert_eq!(invocation.state(), InvocationState::Exited(0));
        assert_eq!(invocation.pending_pipes(), 0);
    })
    .await;
}

#[tokio::test]
async fn combined_output_is_concatenated() {
    local(async {
        let dispatcher = dispatcher();
        let (on_complete, rx) = completion();
        let mut invocation = sh("printf out; printf err >&2");

        let pipe = invocation.capture_output().unwrap();
        invocation.start(&dispatcher, on_complete).unwrap();

        let output = dispatcher.drain(pipe).await.unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "outerr");
        assert_eq!(rx.await.unwrap(), ProcessExit::Exited(0));
    })
    .await;
}

#[tokio::test]
async fn completion_waits_for_late_drain() {
    local(async {
        let dispatcher = dispatcher();
        let fired = Rc::new(Cell::new(false));
        let mut invocation = sh("printf done");

        let pipe = invocation.capture_stdout().unwrap();
        let flag = Rc::clone(&fired);
        invocation
            .start(&dispatcher, move |_| flag.set(true))
            .unwrap();

        // Let the exit watch reap the child before anyone drains.
        while invocation.state() == InvocationState::Running {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!fired.get());

        let output = dispatcher.drain(pipe).await.unwrap();
        assert_eq!(output, b"done");
        assert!(fired.get());
    })
    .await;
}

#[tokio::test]
async fn missing_executable_reports_failure_status() {
    local(async {
        let dispatcher = dispatcher();
        let (on_complete, rx) = completion();
        let mut invocation = Invocation::new();
        invocation.add_arg("kiln-no-such-program-on-path").unwrap();

        let pipe = invocation.capture_stderr().unwrap();
        invocation.start(&dispatcher, on_complete).unwrap();
        let _ = dispatcher.drain(pipe).await.unwrap();

        assert_eq!(
            rx.await.unwrap(),
            ProcessExit::Exited(EXEC_FAILURE_STATUS)
        );
    })
    .await;
}

#[tokio::test]
async fn content_file_argument_runs_as_script() {
    local(async {
        let dispatcher = dispatcher();
        let (on_complete, rx) = completion();
        let mut invocation = Invocation::new();
        invocation.add_arg("sh").unwrap();
        invocation
            .add_file_arg(&ContentFile::new("exit.sh", "exit 4\n"), Usage::Read)
            .unwrap();

        invocation.start(&dispatcher, on_complete).unwrap();
        assert_eq!(rx.await.unwrap(), ProcessExit::Exited(4));
    })
    .await;
}

#[tokio::test]
async fn dropping_running_invocation_reaps_child() {
    local(async {
        let dispatcher = dispatcher();
        let mut invocation = sh("sleep 30");
        invocation.start(&dispatcher, |_| {}).unwrap();
        let pid = invocation.pid().unwrap();

        drop(invocation);

        assert_eq!(
            waitpid(pid, Some(WaitPidFlag::WNOHANG)),
            Err(Errno::ECHILD)
        );
        // The cancelled watch must not trip over the reaped pid.
        tokio::time::sleep(Duration::from_millis(30)).await;
    })
    .await;
}

#[tokio::test]
async fn table_runs_several_invocations() {
    local(async {
        let dispatcher = dispatcher();
        let table = ProcessTable::new();
        let mut receivers = Vec::new();

        for code in 0..3 {
            let (on_complete, rx) = completion();
            table
                .start(sh(&format!("exit {code}")), &dispatcher, on_complete)
                .unwrap();
            receivers.push(rx);
        }
        assert_eq!(table.len(), 3);

        let mut exits = Vec::new();
        for rx in receivers {
            exits.push(rx.await.unwrap());
        }
        assert_eq!(
            exits,
            [
                ProcessExit::Exited(0),
                ProcessExit::Exited(1),
                ProcessExit::Exited(2)
            ]
        );
        assert!(table.is_empty());
    })
    .await;
}
