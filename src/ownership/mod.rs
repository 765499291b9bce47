// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Ownership handles and ownership-aware containers.
//!
//! ```text
//!   Owned<T>  --Shared::from_owned-->  Shared<T>  --downgrade-->  WeakRef<T>
//!      ^                                  |   ^                      |
//!      '------- release_to_owned ---------'   '------ upgrade -------'
//!               (sole strong holder)            (empty once dead)
//!
//!   OwnedVec / OwnedDeque / OwnedQueue / OwnedMap
//!     store Owned<T> slots, hand out &T views,
//!     release* moves an Owned<T> back out.
//! ```
//!
//! Everything here is single-threaded (`Rc`, not `Arc`). Dereferencing an
//! empty handle is a programming error and panics.

mod containers;
mod owned;
mod shared;

#[cfg(test)]
mod tests;

pub use containers::{OwnedDeque, OwnedMap, OwnedQueue, OwnedVec};
pub use owned::Owned;
pub use shared::{Shared, WeakRef};
