// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Containers that own their elements.
//!
//! ```text
//! OwnedVec    [ Owned | Owned | <vacant> | Owned ]   indexed
//! OwnedDeque  front <-> [ ... ] <-> back             both ends
//! OwnedQueue  push -> [ ... ] -> release_front       FIFO
//! OwnedMap    key -> Owned                           unique keys
//! ```
//!
//! Lookups return `&T` views. Only the `release*` family hands ownership
//! back out. Replacing an occupied slot drops the old occupant before the
//! new one is stored. Dropping a container drops every element it still
//! holds.

use std::collections::hash_map::{self, HashMap};
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use super::Owned;

/// Indexed sequence of owned elements.
///
/// [`OwnedVec::release`] leaves a vacant slot so other indices stay put;
/// [`OwnedVec::release_and_shift`] removes the slot.
pub struct OwnedVec<T: ?Sized> {
    slots: Vec<Owned<T>>,
}

impl<T: ?Sized> OwnedVec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Number of slots, vacant ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// View of the element at `index`; `None` if out of range or vacant.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Owned::get)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Owned::get_mut)
    }

    pub fn push(&mut self, value: Owned<T>) {
        self.slots.push(value);
    }

    /// Stores `value` at `index`, dropping the previous occupant first.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: usize, value: Owned<T>) {
        self.slots[index].replace(value);
    }

    /// Takes the element at `index`, leaving the slot vacant.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release(&mut self, index: usize) -> Owned<T> {
        self.slots[index].release()
    }

    /// Removes and returns the last slot. Empty handle if there is none.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release_back(&mut self) -> Owned<T> {
        self.slots.pop().unwrap_or_default()
    }

    /// Removes the slot at `index`, shifting later elements down.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release_and_shift(&mut self, index: usize) -> Owned<T> {
        self.slots.remove(index)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Exchanges contents with `other` without dropping anything.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.slots, &mut other.slots);
    }

    /// Occupied elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Owned::get)
    }
}

impl<T: ?Sized> Default for OwnedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Extend<Owned<T>> for OwnedVec<T> {
    fn extend<I: IntoIterator<Item = Owned<T>>>(&mut self, iter: I) {
        self.slots.extend(iter);
    }
}

impl<T: ?Sized> FromIterator<Owned<T>> for OwnedVec<T> {
    fn from_iter<I: IntoIterator<Item = Owned<T>>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

impl<T: ?Sized> IntoIterator for OwnedVec<T> {
    type Item = Owned<T>;
    type IntoIter = std::vec::IntoIter<Owned<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for OwnedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

/// Double-ended queue of owned elements.
pub struct OwnedDeque<T: ?Sized> {
    items: VecDeque<Owned<T>>,
}

impl<T: ?Sized> OwnedDeque<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).and_then(Owned::get)
    }

    pub fn push_front(&mut self, value: Owned<T>) {
        self.items.push_front(value);
    }

    pub fn push_back(&mut self, value: Owned<T>) {
        self.items.push_back(value);
    }

    /// Empty handle if the deque is empty.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release_front(&mut self) -> Owned<T> {
        self.items.pop_front().unwrap_or_default()
    }

    /// Empty handle if the deque is empty.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release_back(&mut self) -> Owned<T> {
        self.items.pop_back().unwrap_or_default()
    }

    /// Removes the element at `index`, closing the gap.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release_and_shift(&mut self, index: usize) -> Owned<T> {
        match self.items.remove(index) {
            Some(value) => value,
            None => panic!(
                "release_and_shift index {index} out of range (len {})",
                self.items.len()
            ),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.items, &mut other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(Owned::get)
    }
}

impl<T: ?Sized> Default for OwnedDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Extend<Owned<T>> for OwnedDeque<T> {
    fn extend<I: IntoIterator<Item = Owned<T>>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for OwnedDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// FIFO queue of owned elements.
pub struct OwnedQueue<T: ?Sized> {
    items: VecDeque<Owned<T>>,
}

impl<T: ?Sized> OwnedQueue<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// View of the next element to be released.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.items.front().and_then(Owned::get)
    }

    pub fn push(&mut self, value: Owned<T>) {
        self.items.push_back(value);
    }

    /// Oldest element, or an empty handle if the queue is empty.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release_front(&mut self) -> Owned<T> {
        self.items.pop_front().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.items, &mut other.items);
    }
}

impl<T: ?Sized> Default for OwnedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Extend<Owned<T>> for OwnedQueue<T> {
    fn extend<I: IntoIterator<Item = Owned<T>>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for OwnedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// Map from unique keys to owned values.
pub struct OwnedMap<K, V: ?Sized> {
    map: HashMap<K, Owned<V>>,
}

impl<K: Eq + Hash, V: ?Sized> OwnedMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key).and_then(Owned::get)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key).and_then(Owned::get_mut)
    }

    /// Inserts `value`, dropping any value already stored under `key` first.
    pub fn insert(&mut self, key: K, value: Owned<V>) {
        drop(self.map.remove(&key));
        self.map.insert(key, value);
    }

    /// Inserts only if `key` is absent. A rejected `value` is dropped and
    /// `false` is returned.
    pub fn insert_if_absent(&mut self, key: K, value: Owned<V>) -> bool {
        match self.map.entry(key) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            hash_map::Entry::Occupied(_) => false,
        }
    }

    /// Removes the entry and returns its value; empty handle if absent.
    #[must_use = "dropping the released handle destroys the value"]
    pub fn release(&mut self, key: &K) -> Owned<V> {
        self.map.remove(key).unwrap_or_default()
    }

    /// Moves every value out, in unspecified order.
    #[must_use = "dropping the released values destroys them"]
    pub fn release_all(&mut self) -> OwnedVec<V> {
        self.map.drain().map(|(_, value)| value).collect()
    }

    /// Removes and drops the entry. Returns whether it existed.
    pub fn erase(&mut self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.map, &mut other.map);
    }

    /// Key/value views. The borrow prevents mutation while iterating.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map
            .iter()
            .filter_map(|(key, value)| value.get().map(|v| (key, v)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }
}

impl<K: Eq + Hash, V: ?Sized> Default for OwnedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: ?Sized + fmt::Debug> fmt::Debug for OwnedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}
