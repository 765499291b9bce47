// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the ownership handles and containers.
//!
//! Every test counts drops through a shared log so "destroyed exactly
//! once, exactly when" can be asserted directly.

use std::cell::RefCell;
use std::rc::Rc;

use kiln::ownership::{Owned, OwnedDeque, OwnedMap, OwnedQueue, OwnedVec, Shared, WeakRef};

type DropLog = Rc<RefCell<Vec<&'static str>>>;

struct Probe {
    name: &'static str,
    log: DropLog,
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.name);
    }
}

fn probe(log: &DropLog, name: &'static str) -> Probe {
    Probe {
        name,
        log: Rc::clone(log),
    }
}

// =============================================================================
// Shared handles
// =============================================================================

#[test]
fn shared_destroyed_when_last_holder_drops() {
    let log = DropLog::default();
    let first = Shared::new(probe(&log, "a"));
    let copies: Vec<_> = (0..5).map(|_| first.clone()).collect();
    assert_eq!(first.strong_count(), 6);

    drop(first);
    for (i, copy) in copies.into_iter().enumerate() {
        assert!(log.borrow().is_empty(), "dropped early at copy {i}");
        drop(copy);
    }
    assert_eq!(*log.borrow(), ["a"]);
}

#[test]
fn shared_clear_and_reassign_drop_once() {
    let log = DropLog::default();
    let mut holder = Shared::new(probe(&log, "a"));
    let other = holder.clone();

    holder.clear();
    assert!(holder.is_empty());
    assert!(log.borrow().is_empty());

    holder = other.clone();
    drop(other);
    assert!(log.borrow().is_empty());
    drop(holder);
    assert_eq!(*log.borrow(), ["a"]);
}

#[test]
fn weak_upgrade_tracks_liveness() {
    let log = DropLog::default();
    let shared = Shared::new(probe(&log, "a"));
    let weak = shared.downgrade();
    let weak_copy: WeakRef<Probe> = weak.clone();

    {
        let upgraded = weak.upgrade();
        assert!(!upgraded.is_empty());
        assert!(upgraded.ptr_eq(&shared));
    }

    drop(shared);
    assert_eq!(*log.borrow(), ["a"]);
    assert!(weak.upgrade().is_empty());
    assert!(!weak_copy.is_live());
}

#[test]
fn release_to_owned_requires_sole_holder() {
    let log = DropLog::default();
    let mut shared = Shared::new(probe(&log, "a"));
    let weak = shared.downgrade();
    let extra = shared.clone();

    assert!(shared.release_to_owned().is_none());
    assert!(!shared.is_empty(), "failed release must not change the handle");
    drop(extra);

    let owned = shared.release_to_owned().unwrap();
    assert!(shared.is_empty());
    assert!(weak.upgrade().is_empty(), "weak must not reach an owned value");
    assert!(log.borrow().is_empty());

    drop(owned);
    assert_eq!(*log.borrow(), ["a"]);
}

#[test]
fn shared_from_owned_takes_ownership() {
    let log = DropLog::default();
    let mut owned = Owned::new(probe(&log, "a"));
    let moved = owned.release();
    assert!(owned.is_empty());

    let shared = Shared::from_owned(moved);
    assert_eq!(shared.strong_count(), 1);
    drop(shared);
    assert_eq!(*log.borrow(), ["a"]);
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn containers_drop_everything_once() {
    let log = DropLog::default();

    let mut vec: OwnedVec<Probe> = OwnedVec::new();
    vec.push(Owned::new(probe(&log, "v1")));
    vec.push(Owned::new(probe(&log, "v2")));

    let mut deque: OwnedDeque<Probe> = OwnedDeque::new();
    deque.push_back(Owned::new(probe(&log, "d1")));
    deque.push_front(Owned::new(probe(&log, "d0")));

    let mut queue: OwnedQueue<Probe> = OwnedQueue::new();
    queue.push(Owned::new(probe(&log, "q1")));

    let mut map: OwnedMap<u32, Probe> = OwnedMap::new();
    map.insert(1, Owned::new(probe(&log, "m1")));

    vec.clear();
    drop(deque);
    drop(queue);
    map.clear();

    let mut dropped = log.borrow().clone();
    dropped.sort_unstable();
    assert_eq!(dropped, ["d0", "d1", "m1", "q1", "v1", "v2"]);
}

#[test]
fn released_elements_outlive_their_container() {
    let log = DropLog::default();

    let mut vec: OwnedVec<Probe> = OwnedVec::new();
    vec.push(Owned::new(probe(&log, "kept")));
    vec.push(Owned::new(probe(&log, "gone")));
    let kept = vec.release_and_shift(0);

    let mut map: OwnedMap<&str, Probe> = OwnedMap::new();
    map.insert("key", Owned::new(probe(&log, "from-map")));
    let from_map = map.release(&"key");

    drop(vec);
    drop(map);
    assert_eq!(*log.borrow(), ["gone"]);

    drop(kept);
    drop(from_map);
    assert_eq!(*log.borrow(), ["gone", "kept", "from-map"]);
}

#[test]
fn map_insert_replaces_and_drops_previous() {
    let log = DropLog::default();
    let mut map: OwnedMap<u32, Probe> = OwnedMap::new();

    map.insert(7, Owned::new(probe(&log, "old")));
    map.insert(7, Owned::new(probe(&log, "new")));
    assert_eq!(*log.borrow(), ["old"]);

    assert!(!map.insert_if_absent(7, Owned::new(probe(&log, "rejected"))));
    assert_eq!(*log.borrow(), ["old", "rejected"]);
    assert_eq!(map.get(&7).map(|p| p.name), Some("new"));
}

#[test]
fn swap_exchanges_without_dropping() {
    let log = DropLog::default();
    let mut left: OwnedQueue<Probe> = OwnedQueue::new();
    let mut right: OwnedQueue<Probe> = OwnedQueue::new();
    left.push(Owned::new(probe(&log, "l")));
    right.push(Owned::new(probe(&log, "r1")));
    right.push(Owned::new(probe(&log, "r2")));

    left.swap(&mut right);
    assert!(log.borrow().is_empty());
    assert_eq!(left.len(), 2);
    assert_eq!(right.front().map(|p| p.name), Some("l"));
}
