// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! External process invocation.
//!
//! ```text
//! Invocation
//!   add_arg / add_file_arg      argv[0] decides PATH lookup vs exact path
//!   capture_stdout              clears combined
//!   capture_stderr              clears combined
//!   capture_output              clears stdout and stderr
//!   start(dispatcher, cb)
//!     fork --> child: dup2 write ends, exec (failure: _exit(1))
//!          --> parent: Running, close write ends, watch exit
//!
//! completion = terminal state && every DrainToken finished
//!
//! drop while Running --> cancel watch, SIGKILL, blocking waitpid
//!
//! ProcessTable owns started invocations, keyed by InvocationId, until
//! their callback fired.
//! ```
//!
//! Everything here runs on one thread. State is shared through
//! [`Shared`](crate::ownership::Shared) handles held only by the
//! invocation; the exit watch and drain tokens hold weak references.

mod invocation;
mod pipe;
mod spawn;
mod table;


pub use invocation::{CapturedPipe, DrainToken, Invocation, InvocationState};
pub use pipe::Streams;
pub use spawn::EXEC_FAILURE_STATUS;
pub use table::{InvocationId, ProcessTable};
