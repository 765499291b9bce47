// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core modules for files, events and processes.
//!
//! ```text
//!              core
//!               |
//!     +---------+---------+
//!     |         |         |
//!     v         v         v
//!    file     event    process
//!     |         |         |
//!   File     Dispatcher  Invocation
//!   DiskRef  ExitWatch   CapturedPipe
//!   Usage    Local-      ProcessTable
//!            Dispatcher
//! ```

pub mod event;
pub mod file;
pub mod process;
