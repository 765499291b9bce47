// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exclusive, move-only ownership handle.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Single-owner handle that may be empty.
///
/// Dropping the handle drops the value. There is no `Clone`: ownership moves,
/// or is taken out with [`Owned::release`], which leaves `self` empty.
pub struct Owned<T: ?Sized> {
    ptr: Option<Box<T>>,
}

impl<T> Owned<T> {
    /// Allocates `value` under a new handle.
    pub fn new(value: T) -> Self {
        Self {
            ptr: Some(Box::new(value)),
        }
    }

    /// Moves the value out, or `None` if the handle is empty.
    pub fn into_inner(self) -> Option<T> {
        self.ptr.map(|b| *b)
    }
}

impl<T: ?Sized> Owned<T> {
    /// An empty handle.
    #[must_use]
    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    /// Takes ownership of an existing allocation.
    ///
    /// This is how a concrete value is stored behind a trait object:
    /// `Owned::<dyn DiskRef>::from_box(Box::new(concrete))`.
    #[must_use]
    pub fn from_box(value: Box<T>) -> Self {
        Self { ptr: Some(value) }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Non-owning view of the value.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.ptr.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.ptr.as_deref_mut()
    }

    /// Moves ownership into a new handle and leaves `self` empty.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release(&mut self) -> Self {
        Self {
            ptr: self.ptr.take(),
        }
    }

    /// Drops the held value, if any.
    pub fn clear(&mut self) {
        self.ptr = None;
    }

    /// Replaces the held value, dropping the previous one first.
    pub fn replace(&mut self, value: Self) {
        self.ptr = None;
        self.ptr = value.ptr;
    }

    #[must_use]
    pub fn into_box(self) -> Option<Box<T>> {
        self.ptr
    }
}

impl<T: ?Sized> Default for Owned<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> From<Box<T>> for Owned<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T: ?Sized> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.ptr.as_deref() {
            Some(value) => value,
            None => panic!("dereferenced an empty Owned handle"),
        }
    }
}

impl<T: ?Sized> DerefMut for Owned<T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.ptr.as_deref_mut() {
            Some(value) => value,
            None => panic!("dereferenced an empty Owned handle"),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr.as_deref() {
            Some(value) => f.debug_tuple("Owned").field(&value).finish(),
            None => f.write_str("Owned(<empty>)"),
        }
    }
}
