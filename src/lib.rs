// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |             run / options / inis
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              |   TOML, env, --set        |
//!              '-------------+-------------'
//!                            |
//!   +------------------------v----------------+
//!   |  core   process  <-- event, file        |
//!   |         Invocation, ProcessTable,       |
//!   |         LocalDispatcher, DiskRef        |
//!   +-----------------------------------------+
//!   |  ownership  Owned, Shared, WeakRef,     |
//!   |             OwnedVec/Deque/Queue/Map    |
//!   +-----------------------------------------+
//!   |  foundation   error, logging            |
//!   +-----------------------------------------+
//! ```
//!
//! Everything below `cmd` assumes a single thread of control: handles are
//! `Rc`-based and dispatcher callbacks run on the thread that registered
//! them.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod ownership;
