// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! One external process invocation.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fmt;
use std::os::fd::OwnedFd;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::waitpid;
use nix::unistd::Pid;
use tracing::{debug, trace, warn};

use super::pipe::{self, PipeBinding, Streams};
use super::spawn::{self, ExecPlan};
use crate::core::event::{Dispatcher, ExitWatch, ProcessExit};
use crate::core::file::{DiskRef, File, Usage};
use crate::error::ProcessError;
use crate::ownership::{Owned, OwnedVec, Shared, WeakRef};

/// Lifecycle of an invocation.
///
/// `NotStarted -> Running -> Exited | Signaled`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    NotStarted,
    Running,
    Exited(i32),
    Signaled(i32),
}

impl InvocationState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exited(_) | Self::Signaled(_))
    }

    /// The terminal outcome, if there is one.
    #[must_use]
    pub const fn exit(self) -> Option<ProcessExit> {
        match self {
            Self::Exited(code) => Some(ProcessExit::Exited(code)),
            Self::Signaled(signal) => Some(ProcessExit::Signaled(signal)),
            Self::NotStarted | Self::Running => None,
        }
    }
}

impl From<ProcessExit> for InvocationState {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Exited(code) => Self::Exited(code),
            ProcessExit::Signaled(signal) => Self::Signaled(signal),
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running => write!(f, "running"),
            Self::Exited(code) => write!(f, "exited ({code})"),
            Self::Signaled(signal) => write!(f, "signaled ({signal})"),
        }
    }
}

type CompletionCallback = dyn FnOnce(ProcessExit);

/// Mutable record shared between the invocation, its exit watch and its
/// drain tokens. Only the invocation holds it strongly.
struct State {
    args: Vec<OsString>,
    search_path: bool,
    disk_refs: OwnedVec<dyn DiskRef>,
    stdout: Owned<PipeBinding>,
    stderr: Owned<PipeBinding>,
    combined: Owned<PipeBinding>,
    next_serial: u64,
    pending: Vec<u64>,
    status: InvocationState,
    pid: Option<Pid>,
    started_pid: Option<Pid>,
    exit_watch: Option<ExitWatch>,
    on_complete: Owned<CompletionCallback>,
}

impl State {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            search_path: true,
            disk_refs: OwnedVec::new(),
            stdout: Owned::empty(),
            stderr: Owned::empty(),
            combined: Owned::empty(),
            next_serial: 0,
            pending: Vec::new(),
            status: InvocationState::NotStarted,
            pid: None,
            started_pid: None,
            exit_watch: None,
            on_complete: Owned::empty(),
        }
    }

    fn display_name(&self) -> String {
        self.args.first().map_or_else(
            || "process".to_string(),
            |program| {
                Path::new(program).file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
        )
    }

    fn command_line(&self) -> String {
        use std::fmt::Write as _;

        let mut cmd = String::new();
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                cmd.push(' ');
            }
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                let _ = write!(cmd, "\"{arg}\"");
            } else {
                cmd.push_str(&arg);
            }
        }
        cmd
    }

    fn ensure_not_started(&self) -> Result<(), ProcessError> {
        if self.status == InvocationState::NotStarted {
            Ok(())
        } else {
            Err(ProcessError::AlreadyStarted {
                command: self.command_line(),
            })
        }
    }

    fn slot_mut(&mut self, streams: Streams) -> &mut Owned<PipeBinding> {
        if streams == Streams::COMBINED {
            &mut self.combined
        } else if streams == Streams::STDERR {
            &mut self.stderr
        } else {
            &mut self.stdout
        }
    }

    /// Drops a binding displaced by a newer capture selection.
    fn displace(&mut self, streams: Streams) {
        if let Some(old) = self.slot_mut(streams).release().into_inner() {
            trace!(stream = streams.label(), "capture replaced");
            self.pending.retain(|&serial| serial != old.serial);
        }
    }
}

impl Drop for State {
    fn drop(&mut self) {
        let Some(watch) = self.exit_watch.take() else {
            return;
        };
        watch.cancel();

        let Some(pid) = self.pid.take() else {
            return;
        };
        debug!(%pid, cmd = %self.command_line(), "killing unfinished process");
        if let Err(errno) = kill(pid, Signal::SIGKILL) {
            warn!(%pid, %errno, "failed to kill process");
        }
        loop {
            match waitpid(pid, None) {
                Err(Errno::EINTR) => {}
                Ok(status) => {
                    trace!(%pid, ?status, "reaped on teardown");
                    break;
                }
                Err(errno) => {
                    warn!(%pid, %errno, "failed to reap process");
                    break;
                }
            }
        }
    }
}

/// A configured external process and its completion tracking.
///
/// Configure arguments and captures, then [`Invocation::start`]. The
/// completion callback fires exactly once, after the process terminated
/// and every captured pipe reported drained, in whatever order those
/// happen.
///
/// Dropping a running invocation kills the child with `SIGKILL` and reaps
/// it before returning.
///
/// ```text
/// capture_*() --> CapturedPipe { read_end, DrainToken }
///                                            |
/// start() --> fork/exec                      | finish()
///             exit watch --------+           |
///                                v           v
///                         terminal state + no pending pipes
///                                    |
///                           completion callback
/// ```
pub struct Invocation {
    state: Shared<RefCell<State>>,
}

impl Default for Invocation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Invocation")
            .field("args", &state.args)
            .field("search_path", &state.search_path)
            .field("status", &state.status)
            .field("pid", &state.pid)
            .field("pending_pipes", &state.pending.len())
            .finish_non_exhaustive()
    }
}

impl Invocation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Shared::new(RefCell::new(State::new())),
        }
    }

    /// Appends a plain argument.
    ///
    /// The first argument names the program and is looked up in `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::AlreadyStarted`] once started.
    pub fn add_arg(&mut self, arg: impl Into<OsString>) -> Result<&mut Self, ProcessError> {
        let mut state = self.state.borrow_mut();
        state.ensure_not_started()?;
        if state.args.is_empty() {
            state.search_path = true;
        }
        state.args.push(arg.into());
        drop(state);
        Ok(self)
    }

    /// Appends several plain arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::AlreadyStarted`] once started.
    pub fn add_args<I, S>(&mut self, args: I) -> Result<&mut Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        for arg in args {
            self.add_arg(arg)?;
        }
        Ok(self)
    }

    /// Appends the on-disk path of `file`.
    ///
    /// The disk reference is kept until the process terminates. As the
    /// first argument, the path is executed as given, without `PATH`
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::AlreadyStarted`] once started, or
    /// [`ProcessError::File`] if `file` cannot be provided for `usage`.
    pub fn add_file_arg(
        &mut self,
        file: &dyn File,
        usage: Usage,
    ) -> Result<&mut Self, ProcessError> {
        self.state.borrow().ensure_not_started()?;
        let disk_ref = file.on_disk(usage)?;
        let path = disk_ref.path().as_os_str().to_os_string();
        trace!(
            file = %file.display_name(),
            path = %disk_ref.path().display(),
            "file argument"
        );

        let mut state = self.state.borrow_mut();
        if state.args.is_empty() {
            state.search_path = false;
        }
        state.args.push(path);
        state.disk_refs.push(disk_ref);
        drop(state);
        Ok(self)
    }

    /// Captures the child's stdout. Clears a combined capture.
    ///
    /// # Errors
    ///
    /// Fails if already started or if no pipe can be allocated.
    pub fn capture_stdout(&mut self) -> Result<CapturedPipe, ProcessError> {
        self.capture(Streams::STDOUT)
    }

    /// Captures the child's stderr. Clears a combined capture.
    ///
    /// # Errors
    ///
    /// Fails if already started or if no pipe can be allocated.
    pub fn capture_stderr(&mut self) -> Result<CapturedPipe, ProcessError> {
        self.capture(Streams::STDERR)
    }

    /// Captures stdout and stderr on one pipe. Clears both separate
    /// captures.
    ///
    /// # Errors
    ///
    /// Fails if already started or if no pipe can be allocated.
    pub fn capture_output(&mut self) -> Result<CapturedPipe, ProcessError> {
        self.capture(Streams::COMBINED)
    }

    fn capture(&mut self, streams: Streams) -> Result<CapturedPipe, ProcessError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_not_started()?;

        let (read_end, write_end) = pipe::allocate()?;

        if streams == Streams::COMBINED {
            state.displace(Streams::STDOUT);
            state.displace(Streams::STDERR);
        }
        state.displace(Streams::COMBINED);
        state.displace(streams);

        let serial = state.next_serial;
        state.next_serial += 1;
        state.slot_mut(streams).replace(Owned::new(PipeBinding {
            serial,
            streams,
            write_end,
        }));
        state.pending.push(serial);
        drop(guard);

        Ok(CapturedPipe {
            read_end,
            token: DrainToken {
                state: self.state.downgrade(),
                serial,
                streams,
            },
        })
    }

    /// Forks and execs the program, then watches for its exit. Returns the
    /// child pid.
    ///
    /// `on_complete` runs once the process terminated and every captured
    /// pipe was drained.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::AlreadyStarted`] on a second call.
    /// - [`ProcessError::NoArguments`] without a program.
    /// - [`ProcessError::InvalidArgument`] for an argument with a NUL byte.
    /// - [`ProcessError::ForkFailed`] with the OS error if `fork` fails.
    pub fn start(
        &mut self,
        dispatcher: &dyn Dispatcher,
        on_complete: impl FnOnce(ProcessExit) + 'static,
    ) -> Result<Pid, ProcessError> {
        let (plan, command) = {
            let state = self.state.borrow();
            state.ensure_not_started()?;

            let redirects = [&state.stdout, &state.stderr, &state.combined]
                .into_iter()
                .filter_map(Owned::get)
                .flat_map(|binding| {
                    let fd = binding.raw_write_end();
                    binding.streams.targets().map(move |target| (fd, target))
                })
                .collect();
            let plan = ExecPlan::prepare(&state.args, state.search_path, redirects)?;
            (plan, state.command_line())
        };

        debug!(cmd = %command, "exec");
        let pid = spawn::fork_and_exec(&plan)
            .map_err(|source| ProcessError::ForkFailed { command, source })?;
        trace!(process = %self.display_name(), %pid, "spawned");

        {
            let mut state = self.state.borrow_mut();
            state.status = InvocationState::Running;
            state.pid = Some(pid);
            state.started_pid = Some(pid);
            // The child holds the only write ends now.
            state.stdout.clear();
            state.stderr.clear();
            state.combined.clear();
            state.on_complete = Owned::<CompletionCallback>::from_box(Box::new(on_complete));
        }

        let weak = self.state.downgrade();
        let watch = dispatcher.on_process_exit(
            pid,
            Box::new(move |exit| {
                let state = weak.upgrade();
                if !state.is_empty() {
                    process_exited(&state, exit);
                }
            }),
        );

        let mut state = self.state.borrow_mut();
        if state.status == InvocationState::Running {
            state.exit_watch = Some(watch);
        }
        Ok(pid)
    }

    #[must_use]
    pub fn state(&self) -> InvocationState {
        self.state.borrow().status
    }

    /// Child pid while running.
    #[must_use]
    pub fn pid(&self) -> Option<Pid> {
        self.state.borrow().pid
    }

    /// Pid the child was started as; kept after it terminated.
    #[must_use]
    pub fn started_pid(&self) -> Option<Pid> {
        self.state.borrow().started_pid
    }

    /// Captured pipes not yet reported drained.
    #[must_use]
    pub fn pending_pipes(&self) -> usize {
        self.state.borrow().pending.len()
    }

    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        self.state.borrow().args.clone()
    }

    /// Whether the program is looked up in `PATH`.
    #[must_use]
    pub fn searches_path(&self) -> bool {
        self.state.borrow().search_path
    }

    /// Program file stem, for logs.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.state.borrow().display_name()
    }

    /// Arguments joined for logging, quoting those with spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.state.borrow().command_line()
    }
}

/// Records termination, releases disk references and re-checks completion.
fn process_exited(state: &Shared<RefCell<State>>, exit: ProcessExit) {
    {
        let mut state = state.borrow_mut();
        if state.status != InvocationState::Running {
            return;
        }
        state.status = exit.into();
        state.exit_watch = None;
        state.pid = None;
        state.disk_refs.clear();
    }
    trace!(%exit, "process terminated");
    maybe_complete(state);
}

fn pipe_drained(state: &Shared<RefCell<State>>, serial: u64) {
    {
        let mut state = state.borrow_mut();
        if state.status == InvocationState::NotStarted {
            trace!(serial, "drain reported before start ignored");
            return;
        }
        let before = state.pending.len();
        state.pending.retain(|&pending| pending != serial);
        if state.pending.len() == before {
            return;
        }
    }
    maybe_complete(state);
}

/// Fires the completion callback once both conditions hold.
///
/// The callback is detached and the borrow released before it runs, so
/// it may drop the invocation.
fn maybe_complete(state: &Shared<RefCell<State>>) {
    let (callback, exit) = {
        let mut state = state.borrow_mut();
        if !state.pending.is_empty() {
            return;
        }
        let Some(exit) = state.status.exit() else {
            return;
        };
        (state.on_complete.release(), exit)
    };

    if let Some(callback) = callback.into_box() {
        callback(exit);
    }
}

/// Read end of a captured pipe plus the token that reports it drained.
#[derive(Debug)]
pub struct CapturedPipe {
    read_end: OwnedFd,
    token: DrainToken,
}

impl CapturedPipe {
    #[must_use]
    pub const fn streams(&self) -> Streams {
        self.token.streams
    }

    #[must_use]
    pub fn into_parts(self) -> (OwnedFd, DrainToken) {
        (self.read_end, self.token)
    }
}

/// Reports a captured pipe drained, at most once.
///
/// Dropping a token without calling [`DrainToken::finish`] leaves the
/// invocation waiting for that pipe. Tokens of captures replaced by a
/// later selection are ignored. A `finish` before the invocation started is
/// ignored too and the pipe stays pending, since the child has not
/// inherited the write end yet.
#[must_use = "an unfinished token keeps the invocation from completing"]
pub struct DrainToken {
    state: WeakRef<RefCell<State>>,
    serial: u64,
    streams: Streams,
}

impl fmt::Debug for DrainToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrainToken")
            .field("serial", &self.serial)
            .field("streams", &self.streams)
            .field("live", &self.state.is_live())
            .finish()
    }
}

impl DrainToken {
    #[must_use]
    pub const fn streams(&self) -> Streams {
        self.streams
    }

    /// Display name of the owning invocation, or `"process"` once gone.
    #[must_use]
    pub fn process_name(&self) -> String {
        self.state
            .upgrade()
            .get()
            .map_or_else(|| "process".to_string(), |state| state.borrow().display_name())
    }

    /// The pipe reached end of stream.
    ///
    /// Has no effect before [`Invocation::start`].
    pub fn finish(self) {
        let state = self.state.upgrade();
        if !state.is_empty() {
            pipe_drained(&state, self.serial);
        }
    }
}
