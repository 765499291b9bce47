// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolving logical files to on-disk paths.
//!
//! ```text
//! File::on_disk(Usage) --> Owned<dyn DiskRef> --> path()
//!                                 |
//!                    path valid until the ref is dropped
//!
//! LocalFile    existing path, ref is a plain binding
//! ContentFile  bytes in memory, ref owns a temp file (deleted on drop)
//! ```

mod content;
mod local;


use std::fmt;
use std::path::Path;

use crate::error::FileError;
use crate::ownership::Owned;

pub use content::ContentFile;
pub use local::LocalFile;

/// What the caller intends to do with the on-disk path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Read only; the file must exist.
    Read,
    /// Create or overwrite; the file need not exist.
    Write,
    /// Modify in place; the file must exist.
    Update,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// A live binding between a logical file and a concrete path.
///
/// The path stays valid for as long as the reference is alive.
pub trait DiskRef: fmt::Debug {
    fn path(&self) -> &Path;
}

/// A logical file that can be made available on disk.
pub trait File {
    /// Name used in logs and errors.
    fn display_name(&self) -> String;

    /// Resolves the file for `usage`.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] if the file cannot be provided for `usage`.
    fn on_disk(&self, usage: Usage) -> Result<Owned<dyn DiskRef>, FileError>;
}
