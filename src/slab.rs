//! Entry store backing [`SieveCache`](crate::SieveCache).
//!
//! Nodes live in a vector of slots and link to each other by slot number, so
//! the index and the hand hold plain `usize` handles instead of pointers.
//! Freed slots are recycled through a free list, which keeps a slot number
//! stable for the whole lifetime of the entry stored in it.

use std::ops::{Index, IndexMut};

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) visited: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            visited: false,
            prev: None,
            next: None,
        }
    }

    /// Slot of the neighbour closer to the head (the newer entry).
    #[inline]
    pub(crate) fn prev(&self) -> Option<usize> {
        self.prev
    }
}

/// Doubly-linked list of nodes stored in reusable slots.
///
/// The head holds the most recently inserted node, the tail the oldest one.
pub(crate) struct Slab<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> Slab<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn tail(&self) -> Option<usize> {
        self.tail
    }

    /// Store a new unvisited node at the head and return its slot.
    pub(crate) fn push_front(&mut self, key: K, value: V) -> usize {
        let mut node = Node::new(key, value);
        node.next = self.head;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        if let Some(head) = self.head {
            self[head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
        self.len += 1;
        slot
    }

    /// Unlink the node in `slot` and release the slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` does not hold a node.
    pub(crate) fn remove(&mut self, slot: usize) -> Node<K, V> {
        let node = match self.slots.get_mut(slot).and_then(Option::take) {
            Some(node) => node,
            None => panic!("invalid slot {slot}"),
        };
        match node.prev {
            Some(prev) => self[prev].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self[next].prev = node.prev,
            None => self.tail = node.prev,
        }
        self.free.push(slot);
        self.len -= 1;
        node
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate over the nodes from head to tail.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slab: self,
            next: self.head,
        }
    }
}

impl<K, V> Index<usize> for Slab<K, V> {
    type Output = Node<K, V>;

    fn index(&self, slot: usize) -> &Node<K, V> {
        match self.slots.get(slot) {
            Some(Some(node)) => node,
            _ => panic!("invalid slot {slot}"),
        }
    }
}

impl<K, V> IndexMut<usize> for Slab<K, V> {
    fn index_mut(&mut self, slot: usize) -> &mut Node<K, V> {
        match self.slots.get_mut(slot) {
            Some(Some(node)) => node,
            _ => panic!("invalid slot {slot}"),
        }
    }
}

pub(crate) struct Iter<'a, K, V> {
    slab: &'a Slab<K, V>,
    next: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Node<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let slab = self.slab;
        let node = &slab[self.next?];
        self.next = node.next;
        Some(node)
    }
}
