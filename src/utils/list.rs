//! Intrusive doubly-linked list over slab keys.
//!
//! Nodes live in a [`Slab`] and carry their own [`Link`]; the list only records the
//! head, the tail and its length. Appending and removing are O(1) and never move or
//! allocate nodes.

use crate::utils::slab::{Key, Slab};

/// Neighbour keys of a node. Both are `None` while the node is not linked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) prev: Option<Key>,
    pub(crate) next: Option<Key>,
}

/// Values that embed a [`Link`] and can therefore be threaded onto a [`List`].
pub(crate) trait Linked {
    fn link(&self) -> &Link;
    fn link_mut(&mut self) -> &mut Link;
}

#[derive(Debug, Default)]
pub(crate) struct List {
    head: Option<Key>,
    tail: Option<Key>,
    len: usize,
}

impl List {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn head(&self) -> Option<Key> {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Links `key` at the tail.
    ///
    /// The node must not already be a member of any list.
    pub(crate) fn append<T: Linked>(&mut self, slab: &mut Slab<T>, key: Key) {
        let prev = self.tail;
        let Some(node) = slab.get_mut(key) else {
            return;
        };
        *node.link_mut() = Link { prev, next: None };

        match prev.and_then(|tail| slab.get_mut(tail)) {
            Some(tail) => tail.link_mut().next = Some(key),
            None => self.head = Some(key),
        }

        self.tail = Some(key);
        self.len += 1;
    }

    /// Unlinks `key`.
    ///
    /// The node must be a member of this list; membership is tracked by the caller.
    pub(crate) fn remove<T: Linked>(&mut self, slab: &mut Slab<T>, key: Key) {
        let Some(node) = slab.get_mut(key) else {
            return;
        };
        let Link { prev, next } = std::mem::take(node.link_mut());

        match prev.and_then(|p| slab.get_mut(p)) {
            Some(p) => p.link_mut().next = next,
            None => self.head = next,
        }
        match next.and_then(|n| slab.get_mut(n)) {
            Some(n) => n.link_mut().prev = prev,
            None => self.tail = prev,
        }

        self.len -= 1;
    }

    /// Walks the list from head to tail.
    pub(crate) fn iter<'a, T: Linked>(&self, slab: &'a Slab<T>) -> Iter<'a, T> {
        Iter {
            slab,
            cursor: self.head,
        }
    }
}

pub(crate) struct Iter<'a, T> {
    slab: &'a Slab<T>,
    cursor: Option<Key>,
}

impl<T: Linked> Iterator for Iter<'_, T> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        let key = self.cursor?;
        self.cursor = self.slab.get(key).and_then(|node| node.link().next);
        Some(key)
    }
}
