// kiln: build tool process and ownership core
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Owned, OwnedDeque, OwnedMap, OwnedQueue, OwnedVec, Shared, WeakRef};

/// Records its label in a shared log when dropped.
struct Tracked {
    label: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.label);
    }
}

fn tracker() -> (
    Rc<RefCell<Vec<&'static str>>>,
    impl Fn(&'static str) -> Owned<Tracked>,
) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let make_log = Rc::clone(&log);
    let make = move |label| {
        Owned::new(Tracked {
            label,
            log: Rc::clone(&make_log),
        })
    };
    (log, make)
}

trait Tool {
    fn name(&self) -> &'static str;
}

struct Hammer;

impl Tool for Hammer {
    fn name(&self) -> &'static str {
        "hammer"
    }
}

// --- Owned ---

#[test]
fn test_owned_release_moves_value() {
    let (log, make) = tracker();
    let mut first = make("a");
    let second = first.release();

    assert!(first.is_empty());
    assert_eq!(second.label, "a");
    drop(first);
    assert!(log.borrow().is_empty());
    drop(second);
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
fn test_owned_clear_drops_value() {
    let (log, make) = tracker();
    let mut handle = make("a");
    handle.clear();
    assert!(handle.is_empty());
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
#[should_panic(expected = "empty Owned handle")]
fn test_owned_deref_empty_panics() {
    let handle: Owned<u32> = Owned::empty();
    let _ = *handle;
}

#[test]
fn test_owned_trait_object() {
    let tool: Owned<dyn Tool> = Owned::from_box(Box::new(Hammer));
    assert_eq!(tool.name(), "hammer");
}

// --- Shared / WeakRef ---

#[test]
fn test_shared_drops_once_on_last_holder() {
    let drops = Rc::new(Cell::new(0));
    struct Counted(Rc<Cell<u32>>);
    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    let first = Shared::new(Counted(Rc::clone(&drops)));
    let second = first.clone();
    let mut third = second.clone();
    assert_eq!(first.strong_count(), 3);

    drop(first);
    third.clear();
    assert_eq!(drops.get(), 0);
    assert_eq!(second.strong_count(), 1);

    drop(second);
    assert_eq!(drops.get(), 1);
    drop(third);
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_shared_from_owned_takes_ownership() {
    let (log, make) = tracker();
    let shared = Shared::from_owned(make("a"));
    assert_eq!(shared.strong_count(), 1);
    assert_eq!(shared.label, "a");
    drop(shared);
    assert_eq!(*log.borrow(), vec!["a"]);

    let empty: Shared<Tracked> = Shared::from_owned(Owned::empty());
    assert!(empty.is_empty());
}

#[test]
fn test_weak_upgrade_tracks_liveness() {
    let shared = Shared::new(String::from("value"));
    let weak = shared.downgrade();
    let weak_copy = WeakRef::from(&shared);

    assert!(weak.is_live());
    assert_eq!(shared.weak_count(), 2);
    let upgraded = weak.upgrade();
    assert_eq!(upgraded.as_str(), "value");
    assert_eq!(shared.strong_count(), 2);

    drop(upgraded);
    drop(shared);
    assert!(!weak.is_live());
    assert!(weak.upgrade().is_empty());
    assert!(weak_copy.clone().upgrade().is_empty());
}

#[test]
fn test_weak_does_not_keep_value_alive() {
    let (log, make) = tracker();
    let shared = Shared::from_owned(make("a"));
    let weak = shared.downgrade();
    drop(shared);
    assert_eq!(*log.borrow(), vec!["a"]);
    assert!(weak.upgrade().is_empty());
}

#[test]
fn test_release_to_owned_requires_sole_holder() {
    let mut shared = Shared::new(7_u32);
    let other = shared.clone();

    assert!(shared.release_to_owned().is_none());
    assert_eq!(shared.strong_count(), 2, "failed release must not change counts");
    assert_eq!(*shared, 7);

    drop(other);
    let weak = shared.downgrade();
    let owned = shared.release_to_owned().expect("sole holder");
    assert_eq!(*owned, 7);
    assert!(shared.is_empty());
    assert!(weak.upgrade().is_empty());
}

#[test]
#[should_panic(expected = "empty Shared handle")]
fn test_shared_deref_empty_panics() {
    let shared: Shared<u32> = Shared::empty();
    let _ = *shared;
}

#[test]
fn test_shared_allocate_as_trait_object() {
    let tool: Shared<dyn Tool> = Shared::from_box(Box::new(Hammer));
    assert_eq!(tool.name(), "hammer");

    let concrete = Shared::new(Hammer);
    let weak = concrete.downgrade();
    let as_tool: Shared<dyn Tool> = concrete.upcast(|rc| rc as Rc<dyn Tool>);
    assert_eq!(as_tool.name(), "hammer");
    assert!(weak.is_live());
    drop(as_tool);
    assert!(!weak.is_live());
}

#[test]
fn test_shared_ptr_eq() {
    let a = Shared::new(1);
    let b = a.clone();
    let c = Shared::new(1);
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&c));
    assert!(Shared::<i32>::empty().ptr_eq(&Shared::empty()));
}

// --- Containers ---

#[test]
fn test_vec_release_keeps_indices_stable() {
    let (log, make) = tracker();
    let mut vec = OwnedVec::new();
    vec.push(make("a"));
    vec.push(make("b"));
    vec.push(make("c"));

    let released = vec.release(1);
    assert_eq!(vec.len(), 3);
    assert!(vec.get(1).is_none());
    assert_eq!(vec.get(2).map(|t| t.label), Some("c"));

    drop(vec);
    assert_eq!(*log.borrow(), vec!["a", "c"]);
    drop(released);
    assert_eq!(*log.borrow(), vec!["a", "c", "b"]);
}

#[test]
fn test_vec_set_drops_previous_first() {
    let (log, make) = tracker();
    let mut vec = OwnedVec::new();
    vec.push(make("old"));
    vec.set(0, make("new"));
    assert_eq!(*log.borrow(), vec!["old"]);
    assert_eq!(vec.get(0).map(|t| t.label), Some("new"));
}

#[test]
fn test_vec_release_and_shift_and_back() {
    let (log, make) = tracker();
    let mut vec: OwnedVec<Tracked> = ["a", "b", "c"].into_iter().map(&make).collect();

    let b = vec.release_and_shift(1);
    assert_eq!(b.label, "b");
    assert_eq!(vec.len(), 2);
    assert_eq!(vec.get(1).map(|t| t.label), Some("c"));

    let c = vec.release_back();
    assert_eq!(c.label, "c");
    assert!(vec.release_back().label == "a");
    assert!(vec.release_back().is_empty());
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
fn test_vec_clear_and_swap() {
    let (log, make) = tracker();
    let mut left = OwnedVec::new();
    left.push(make("a"));
    let mut right = OwnedVec::new();
    right.push(make("b"));
    right.push(make("c"));

    left.swap(&mut right);
    assert!(log.borrow().is_empty());
    assert_eq!(left.len(), 2);
    assert_eq!(right.len(), 1);

    left.clear();
    assert_eq!(*log.borrow(), vec!["b", "c"]);
    assert!(left.is_empty());
}

#[test]
fn test_deque_both_ends() {
    let (log, make) = tracker();
    let mut deque = OwnedDeque::new();
    deque.push_back(make("b"));
    deque.push_front(make("a"));
    deque.push_back(make("c"));

    assert_eq!(deque.get(0).map(|t| t.label), Some("a"));
    assert_eq!(deque.release_front().label, "a");
    assert_eq!(deque.release_back().label, "c");
    assert_eq!(*log.borrow(), vec!["a", "c"]);

    let kept = deque.release_and_shift(0);
    assert!(deque.is_empty());
    assert!(deque.release_front().is_empty());
    drop(deque);
    assert_eq!(*log.borrow(), vec!["a", "c"]);
    drop(kept);
    assert_eq!(*log.borrow(), vec!["a", "c", "b"]);
}

#[test]
fn test_queue_fifo_order() {
    let (log, make) = tracker();
    let mut queue = OwnedQueue::new();
    queue.extend(["a", "b", "c"].into_iter().map(&make));

    assert_eq!(queue.front().map(|t| t.label), Some("a"));
    let first = queue.release_front();
    assert_eq!(first.label, "a");
    assert_eq!(queue.len(), 2);

    drop(queue);
    assert_eq!(*log.borrow(), vec!["b", "c"]);
}

#[test]
fn test_map_insert_replaces_and_drops() {
    let (log, make) = tracker();
    let mut map = OwnedMap::new();
    map.insert("k", make("first"));
    map.insert("k", make("second"));

    assert_eq!(*log.borrow(), vec!["first"]);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"k").map(|t| t.label), Some("second"));
}

#[test]
fn test_map_insert_if_absent() {
    let (log, make) = tracker();
    let mut map = OwnedMap::new();
    assert!(map.insert_if_absent("k", make("kept")));
    assert!(!map.insert_if_absent("k", make("rejected")));

    assert_eq!(*log.borrow(), vec!["rejected"]);
    assert_eq!(map.get(&"k").map(|t| t.label), Some("kept"));
}

#[test]
fn test_map_release_erase_release_all() {
    let (log, make) = tracker();
    let mut map = OwnedMap::new();
    map.insert(1, make("a"));
    map.insert(2, make("b"));
    map.insert(3, make("c"));

    let a = map.release(&1);
    assert_eq!(a.label, "a");
    assert!(!map.contains(&1));
    assert!(map.release(&1).is_empty());

    assert!(map.erase(&2));
    assert!(!map.erase(&2));
    assert_eq!(*log.borrow(), vec!["b"]);

    let rest = map.release_all();
    assert!(map.is_empty());
    assert_eq!(rest.len(), 1);
    drop(map);
    assert_eq!(*log.borrow(), vec!["b"]);
    drop(rest);
    assert_eq!(*log.borrow(), vec!["b", "c"]);
}

#[test]
fn test_map_iter_and_swap() {
    let mut map = OwnedMap::new();
    map.insert("x", Owned::new(1));
    map.insert("y", Owned::new(2));

    let mut pairs: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
    pairs.sort_unstable();
    insta::assert_debug_snapshot!(pairs, @r#"
    [
        (
            "x",
            1,
        ),
        (
            "y",
            2,
        ),
    ]
    "#);

    let mut other = OwnedMap::new();
    map.swap(&mut other);
    assert!(map.is_empty());
    assert_eq!(other.len(), 2);
}

#[test]
fn test_containers_drop_everything() {
    let (log, make) = tracker();
    {
        let mut vec = OwnedVec::new();
        vec.push(make("v"));
        let mut deque = OwnedDeque::new();
        deque.push_back(make("d"));
        let mut queue = OwnedQueue::new();
        queue.push(make("q"));
        let mut map = OwnedMap::new();
        map.insert(0, make("m"));
    }
    let mut dropped = log.borrow().clone();
    dropped.sort_unstable();
    assert_eq!(dropped, vec!["d", "m", "q", "v"]);
}
