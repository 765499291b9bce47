// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registry of started invocations.
//!
//! The table owns each started invocation until its completion callback
//! has fired, so callers never have to keep the invocation alive
//! themselves and completion never drops the invocation from inside its
//! own callback.
//!
//! Entries are keyed by an [`InvocationId`] handed out per table, never by
//! pid: an entry outlives its reaped child until every captured pipe
//! drained, and the kernel may reuse the pid in the meantime.

use std::cell::{Cell, RefCell};
use std::fmt;

use nix::unistd::Pid;
use tracing::trace;

use super::invocation::{Invocation, InvocationState};
use crate::core::event::{Dispatcher, ProcessExit};
use crate::error::ProcessError;
use crate::ownership::{Owned, OwnedMap, Shared};

/// Key of an invocation in a [`ProcessTable`]. Never reused by a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(u64);

impl InvocationId {
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Entries {
    invocations: OwnedMap<InvocationId, Invocation>,
    next_id: u64,
}

impl Entries {
    fn allocate_id(&mut self) -> InvocationId {
        let id = InvocationId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Owns started invocations until they complete.
///
/// Clones share the same table. Dropping the last handle tears down every
/// invocation still running.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    entries: Shared<RefCell<Entries>>,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Shared::new(RefCell::new(Entries::default())),
        }
    }

    /// Starts `invocation` and keeps it until `on_complete` has run.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Invocation::start`]; the invocation is
    /// dropped in that case.
    pub fn start(
        &self,
        mut invocation: Invocation,
        dispatcher: &dyn Dispatcher,
        on_complete: impl FnOnce(ProcessExit) + 'static,
    ) -> Result<InvocationId, ProcessError> {
        let id = self.entries.borrow_mut().allocate_id();
        let completed = Shared::new(Cell::new(false));
        let entries = self.entries.downgrade();

        let flag = completed.clone();
        let pid = invocation.start(dispatcher, move |exit| {
            let table = entries.upgrade();
            if let Some(table) = table.get() {
                // Dropped after the borrow ends; the exit callback still
                // holds the invocation state.
                let released = table.borrow_mut().invocations.release(&id);
                if !released.is_empty() {
                    trace!(%id, "released from process table");
                }
                drop(released);
            }
            flag.set(true);
            on_complete(exit);
        })?;

        // Completion may already have run inside `start`.
        if !Cell::get(&completed) {
            trace!(%id, %pid, "registered");
            self.entries
                .borrow_mut()
                .invocations
                .insert(id, Owned::new(invocation));
        }
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().invocations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().invocations.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: InvocationId) -> bool {
        self.entries.borrow().invocations.contains(&id)
    }

    #[must_use]
    pub fn state(&self, id: InvocationId) -> Option<InvocationState> {
        self.entries
            .borrow()
            .invocations
            .get(&id)
            .map(Invocation::state)
    }

    /// Pid the invocation was started as, even after it terminated.
    #[must_use]
    pub fn pid(&self, id: InvocationId) -> Option<Pid> {
        self.entries
            .borrow()
            .invocations
            .get(&id)
            .and_then(Invocation::started_pid)
    }

    /// Ids of every invocation still in the table, oldest first.
    #[must_use]
    pub fn ids(&self) -> Vec<InvocationId> {
        let mut ids: Vec<_> = self.entries.borrow().invocations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes an invocation without waiting for it.
    ///
    /// Dropping the returned handle kills and reaps a running child.
    #[must_use = "dropping the released invocation kills the process"]
    pub fn release(&self, id: InvocationId) -> Owned<Invocation> {
        self.entries.borrow_mut().invocations.release(&id)
    }

    /// Kills and reaps every invocation still running.
    pub fn clear(&self) {
        let released = self.entries.borrow_mut().invocations.release_all();
        drop(released);
    }
}
