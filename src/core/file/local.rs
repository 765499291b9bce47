// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};

use tracing::trace;

use super::{DiskRef, File, Usage};
use crate::error::FileError;
use crate::ownership::Owned;

/// A file that already lives at a path.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
struct LocalDiskRef {
    path: PathBuf,
}

impl DiskRef for LocalDiskRef {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl File for LocalFile {
    fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    fn on_disk(&self, usage: Usage) -> Result<Owned<dyn DiskRef>, FileError> {
        match usage {
            Usage::Read | Usage::Update => {
                if !self.path.exists() {
                    return Err(FileError::NotFound {
                        path: self.display_name(),
                    });
                }
            }
            Usage::Write => {
                if let Some(parent) = self.path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent).map_err(|source| FileError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
                }
            }
        }

        trace!(path = %self.path.display(), %usage, "disk ref");
        Ok(Owned::<dyn DiskRef>::from_box(Box::new(LocalDiskRef {
            path: self.path.clone(),
        })))
    }
}
