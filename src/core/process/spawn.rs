// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fork and exec.
//!
//! ```text
//! ExecPlan::prepare   (parent, may allocate)
//!   argv CStrings + null-terminated pointer array
//!   redirects (write end -> 1 and/or 2)
//!   exec failure message
//!        |
//! fork_and_exec
//!   parent --> Ok(pid)
//!   child  --> dup2 redirects, execvp/execv
//!              on failure: write message to fd 2, _exit(1)
//! ```
//!
//! The child branch only calls async-signal-safe functions on data
//! prepared before the fork.

use std::ffi::{CString, OsString};
use std::os::fd::RawFd;
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;

use nix::errno::Errno;
use nix::libc;
use nix::unistd::{ForkResult, Pid, fork};

use crate::error::ProcessError;

/// Status of a child whose exec failed. Indistinguishable from the program
/// itself exiting with 1.
pub const EXEC_FAILURE_STATUS: i32 = 1;

/// Everything the child needs, prepared before forking.
#[derive(Debug)]
pub(super) struct ExecPlan {
    argv: Vec<CString>,
    argv_ptrs: Vec<*const c_char>,
    search_path: bool,
    redirects: Vec<(RawFd, RawFd)>,
    failure_message: Vec<u8>,
}

impl ExecPlan {
    /// `redirects` pairs a pipe write end with the standard descriptor it
    /// replaces in the child.
    pub(super) fn prepare(
        args: &[OsString],
        search_path: bool,
        redirects: Vec<(RawFd, RawFd)>,
    ) -> Result<Self, ProcessError> {
        if args.is_empty() {
            return Err(ProcessError::NoArguments);
        }

        let argv = args
            .iter()
            .map(|arg| {
                CString::new(arg.as_bytes()).map_err(|_| ProcessError::InvalidArgument {
                    arg: arg.to_string_lossy().into_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let argv_ptrs = argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();

        let failure_message = format!(
            "kiln: failed to execute '{}'\n",
            args[0].to_string_lossy()
        )
        .into_bytes();

        Ok(Self {
            argv,
            argv_ptrs,
            search_path,
            redirects,
            failure_message,
        })
    }

    /// Replaces the current process image. Only returns by exiting.
    ///
    /// # Safety
    ///
    /// Must only run in a freshly forked child.
    unsafe fn exec_child(&self) -> ! {
        for &(src, dst) in &self.redirects {
            // SAFETY: plain syscalls on descriptors owned by this process.
            unsafe {
                if src == dst {
                    // dup2 onto itself keeps close-on-exec set.
                    libc::fcntl(src, libc::F_SETFD, 0);
                } else {
                    libc::dup2(src, dst);
                }
            }
        }

        let program = self.argv[0].as_ptr();
        // SAFETY: argv_ptrs is null-terminated and points into self.argv,
        // which outlives the call.
        unsafe {
            if self.search_path {
                libc::execvp(program, self.argv_ptrs.as_ptr());
            } else {
                libc::execv(program, self.argv_ptrs.as_ptr());
            }
        }

        // SAFETY: write and _exit are async-signal-safe.
        unsafe {
            libc::write(
                libc::STDERR_FILENO,
                self.failure_message.as_ptr().cast(),
                self.failure_message.len(),
            );
            libc::_exit(EXEC_FAILURE_STATUS)
        }
    }
}

/// Forks and execs `plan` in the child.
///
/// # Errors
///
/// Returns the errno of a failed `fork`.
pub(super) fn fork_and_exec(plan: &ExecPlan) -> Result<Pid, Errno> {
    // SAFETY: the child branch only runs exec_child, which sticks to
    // async-signal-safe calls and never returns.
    match unsafe { fork() }? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => unsafe { plan.exec_child() },
    }
}
