// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reference-counted shared handles and weak references.
//!
//! ```text
//! Shared<T> ---- Rc<T> ----> [ strong | weak | T ]
//! WeakRef<T> --- Weak<T> ------^
//!
//! strong 1 -> 0   T dropped in place, immediately
//! strong 0, weak 0  count block freed
//! ```

use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::Owned;

/// Shared ownership handle. Cloning adds a strong holder.
pub struct Shared<T: ?Sized> {
    ptr: Option<Rc<T>>,
}

impl<T> Shared<T> {
    /// Allocates `value` with a single strong holder.
    pub fn new(value: T) -> Self {
        Self {
            ptr: Some(Rc::new(value)),
        }
    }

    /// Converts back to exclusive ownership.
    ///
    /// Succeeds only when `self` is the sole strong holder. On success `self`
    /// is left empty and every outstanding [`WeakRef`] stops upgrading. On
    /// failure nothing changes and `None` is returned.
    pub fn release_to_owned(&mut self) -> Option<Owned<T>> {
        let rc = self.ptr.take()?;
        match Rc::try_unwrap(rc) {
            Ok(value) => Some(Owned::new(value)),
            Err(rc) => {
                self.ptr = Some(rc);
                None
            }
        }
    }
}

impl<T: ?Sized> Shared<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    /// Takes over an exclusively owned value. An empty `Owned` yields an
    /// empty `Shared`.
    #[must_use]
    pub fn from_owned(owned: Owned<T>) -> Self {
        Self {
            ptr: owned.into_box().map(Rc::from),
        }
    }

    /// Allocates a concrete value and stores it as `T`, usually a trait
    /// object: `Shared::<dyn Tool>::from_box(Box::new(Hammer))`.
    #[must_use]
    pub fn from_box(value: Box<T>) -> Self {
        Self {
            ptr: Some(Rc::from(value)),
        }
    }

    #[must_use]
    pub const fn from_rc(rc: Rc<T>) -> Self {
        Self { ptr: Some(rc) }
    }

    /// Re-types the handle without touching the counts, e.g.
    /// `shared.upcast(|rc| rc as Rc<dyn Tool>)`.
    pub fn upcast<U: ?Sized>(self, f: impl FnOnce(Rc<T>) -> Rc<U>) -> Shared<U> {
        Shared {
            ptr: self.ptr.map(f),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.ptr.as_deref()
    }

    /// Number of strong holders, 0 when empty.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        self.ptr.as_ref().map_or(0, Rc::strong_count)
    }

    #[must_use]
    pub fn weak_count(&self) -> usize {
        self.ptr.as_ref().map_or(0, Rc::weak_count)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef {
            ptr: self.ptr.as_ref().map(Rc::downgrade),
        }
    }

    /// Drops this strong holder, leaving the handle empty.
    pub fn clear(&mut self) {
        self.ptr = None;
    }

    /// True if both handles point at the same allocation. Two empty handles
    /// compare equal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.ptr, &other.ptr) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr.clone(),
        }
    }
}

impl<T: ?Sized> Default for Shared<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> From<Owned<T>> for Shared<T> {
    fn from(owned: Owned<T>) -> Self {
        Self::from_owned(owned)
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.ptr.as_deref() {
            Some(value) => value,
            None => panic!("dereferenced an empty Shared handle"),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr.as_deref() {
            Some(value) => f.debug_tuple("Shared").field(&value).finish(),
            None => f.write_str("Shared(<empty>)"),
        }
    }
}

/// Non-owning observer of a [`Shared`] value.
///
/// Never keeps the value alive and cannot be dereferenced; call
/// [`WeakRef::upgrade`] and check the result.
pub struct WeakRef<T: ?Sized> {
    ptr: Option<Weak<T>>,
}

impl<T: ?Sized> WeakRef<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    /// Returns a strong handle, or an empty one if the value is gone.
    #[must_use]
    pub fn upgrade(&self) -> Shared<T> {
        Shared {
            ptr: self.ptr.as_ref().and_then(Weak::upgrade),
        }
    }

    /// True while at least one strong holder exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.ptr.as_ref().is_some_and(|w| w.strong_count() > 0)
    }
}

impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr.clone(),
        }
    }
}

impl<T: ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> From<&Shared<T>> for WeakRef<T> {
    fn from(shared: &Shared<T>) -> Self {
        shared.downgrade()
    }
}

impl<T: ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_live() { "live" } else { "dead" };
        write!(f, "WeakRef(<{state}>)")
    }
}
