// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pipe allocation and capture bindings.

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use bitflags::bitflags;

use crate::error::ProcessError;

bitflags! {
    /// Standard streams a captured pipe is attached to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Streams: u8 {
        const STDOUT = 1 << 0;
        const STDERR = 1 << 1;
        const COMBINED = Self::STDOUT.bits() | Self::STDERR.bits();
    }
}

impl Streams {
    /// Name used in logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        if self == Self::COMBINED {
            "output"
        } else if self == Self::STDERR {
            "stderr"
        } else {
            "stdout"
        }
    }

    /// Standard descriptors the write end is attached to in the child.
    pub(super) fn targets(self) -> impl Iterator<Item = RawFd> {
        [(Self::STDOUT, 1), (Self::STDERR, 2)]
            .into_iter()
            .filter(move |(stream, _)| self.contains(*stream))
            .map(|(_, fd)| fd)
    }
}

/// Write end kept by the invocation until start.
#[derive(Debug)]
pub(super) struct PipeBinding {
    pub(super) serial: u64,
    pub(super) streams: Streams,
    pub(super) write_end: OwnedFd,
}

impl PipeBinding {
    pub(super) fn raw_write_end(&self) -> RawFd {
        self.write_end.as_raw_fd()
    }
}

/// Allocates a pipe, returning `(read_end, write_end)`.
///
/// Both ends are close-on-exec so no other child inherits them.
#[cfg(not(target_vendor = "apple"))]
pub(super) fn allocate() -> Result<(OwnedFd, OwnedFd), ProcessError> {
    use nix::fcntl::OFlag;

    nix::unistd::pipe2(OFlag::O_CLOEXEC).map_err(|source| ProcessError::PipeFailed { source })
}

#[cfg(target_vendor = "apple")]
pub(super) fn allocate() -> Result<(OwnedFd, OwnedFd), ProcessError> {
    use nix::fcntl::{FcntlArg, FdFlag, fcntl};

    let (read_end, write_end) =
        nix::unistd::pipe().map_err(|source| ProcessError::PipeFailed { source })?;
    for fd in [&read_end, &write_end] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(|source| ProcessError::PipeFailed { source })?;
    }
    Ok((read_end, write_end))
}
