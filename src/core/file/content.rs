// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Write as _;
use std::path::Path;

use tempfile::TempPath;
use tracing::trace;

use super::{DiskRef, File, Usage};
use crate::error::FileError;
use crate::ownership::Owned;

/// A file whose content lives in memory.
///
/// Each `on_disk` call writes the bytes to a fresh temporary file. The
/// returned reference deletes it when dropped.
#[derive(Debug, Clone)]
pub struct ContentFile {
    name: String,
    bytes: Vec<u8>,
}

impl ContentFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug)]
struct TempDiskRef {
    path: TempPath,
}

impl DiskRef for TempDiskRef {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl File for ContentFile {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn on_disk(&self, usage: Usage) -> Result<Owned<dyn DiskRef>, FileError> {
        let materialize = |source| FileError::Materialize {
            name: self.name.clone(),
            source,
        };

        let mut file = tempfile::Builder::new()
            .prefix("kiln-")
            .tempfile()
            .map_err(materialize)?;
        // A write-only target starts empty.
        if usage != Usage::Write {
            file.write_all(&self.bytes).map_err(materialize)?;
            file.flush().map_err(materialize)?;
        }
        let path = file.into_temp_path();

        trace!(name = %self.name, path = %path.display(), %usage, "materialized");
        Ok(Owned::<dyn DiskRef>::from_box(Box::new(TempDiskRef { path })))
    }
}
