//! Intrusive doubly linked list backed by `SlotArena`.
//!
//! This is the single list primitive shared by every policy: LRU recency
//! order, ghost lists and the LRU-K history queue are all an
//! `IntrusiveList`. Nodes live in a [`SlotArena`] and link to each other by
//! [`SlotId`], so the arena owns every node and `prev`/`next` are plain
//! indices with no ownership of their own.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬─────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, prev, next }                  │
//!   ├────────┼─────────────────────────────────────────────┤
//!   │ id_1   │ { value: A, prev: None, next: Some(id_2) }  │
//!   │ id_2   │ { value: B, prev: Some(id_1), next: id_3 }  │
//!   │ id_3   │ { value: C, prev: Some(id_2), next: None }  │
//!   └────────┴─────────────────────────────────────────────┘
//!
//!   head (MRU) ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail (LRU)
//! ```
//!
//! `head`/`tail` play the role of sentinels: an empty list has both set to
//! `None`, and every relink rewrites both neighbours plus head/tail inside a
//! single `&mut self` call, so a half-linked node is never observable.
//!
//! ## Performance
//! - `push_front` / `push_back` / `pop_front` / `pop_back`: O(1)
//! - `move_to_front` / `move_to_back` / `remove`: O(1)
//! - `iter` / `check_invariants`: O(n)
use std::collections::HashSet;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Doubly linked list whose nodes are addressed by [`SlotId`].
#[derive(Debug)]
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `id` is currently a node in this list.
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// Value at the front (most recent end).
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Value at the back (least recent end).
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Iterates values from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// Iterates node ids from front to back.
    pub fn iter_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        let mut current = self.head;
        std::iter::from_fn(move || {
            let id = current?;
            current = self.arena.get(id)?.next;
            Some(id)
        })
    }

    /// Inserts a new node at the front and returns its `SlotId`.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: None,
            next: None,
        });
        self.attach_front(id);
        id
    }

    /// Inserts a new node at the back and returns its `SlotId`.
    pub fn push_back(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: None,
            next: None,
        });
        self.attach_back(id);
        id
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let id = self.head?;
        self.remove(id)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Unlinks `id` and frees its slot. Returns `None` if `id` is not a node.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.detach(id)?;
        self.arena.remove(id).map(|node| node.value)
    }

    /// Moves an existing node to the front; returns `false` if `id` is not present.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if self.head == Some(id) {
            return true;
        }
        self.detach(id).is_some() && self.attach_front(id).is_some()
    }

    /// Moves an existing node to the back; returns `false` if `id` is not present.
    pub fn move_to_back(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if self.tail == Some(id) {
            return true;
        }
        self.detach(id).is_some() && self.attach_back(id).is_some()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Clears the list and releases the arena's spare capacity.
    pub fn clear_shrink(&mut self) {
        self.clear();
        self.arena.shrink_to_fit();
    }

    fn detach(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.arena.get(id)?;
            (node.prev, node.next)
        };

        match prev {
            Some(prev_id) => self.arena.get_mut(prev_id)?.next = next,
            None => self.head = next,
        }
        match next {
            Some(next_id) => self.arena.get_mut(next_id)?.prev = prev,
            None => self.tail = prev,
        }

        let node = self.arena.get_mut(id)?;
        node.prev = None;
        node.next = None;
        Some(())
    }

    fn attach_front(&mut self, id: SlotId) -> Option<()> {
        let old_head = self.head;
        {
            let node = self.arena.get_mut(id)?;
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old) => self.arena.get_mut(old)?.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        Some(())
    }

    fn attach_back(&mut self, id: SlotId) -> Option<()> {
        let old_tail = self.tail;
        {
            let node = self.arena.get_mut(id)?;
            node.next = None;
            node.prev = old_tail;
        }
        match old_tail {
            Some(old) => self.arena.get_mut(old)?.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        Some(())
    }

    /// Walks the list head to tail and verifies every link.
    ///
    /// Checks that each `prev` points back at its predecessor, that the walk
    /// ends at `tail`, that no node is visited twice and that the walk length
    /// matches the arena's live count.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() != self.tail.is_none() {
            return Err(InvariantError::new("list head/tail disagree on emptiness"));
        }
        let mut seen = HashSet::with_capacity(self.len());
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(InvariantError::new(format!(
                    "list cycle detected at slot {}",
                    id.index()
                )));
            }
            let node = self.arena.get(id).ok_or_else(|| {
                InvariantError::new(format!("list link to freed slot {}", id.index()))
            })?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "slot {} has a stale prev link",
                    id.index()
                )));
            }
            if node.next.is_none() && self.tail != Some(id) {
                return Err(InvariantError::new("list walk ended before tail"));
            }
            prev = Some(id);
            current = node.next;
        }
        if seen.len() != self.arena.len() {
            return Err(InvariantError::new(format!(
                "list reaches {} nodes but arena holds {}",
                seen.len(),
                self.arena.len()
            )));
        }
        Ok(())
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over list values from front to back.
pub struct Iter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some(&node.value)
    }
}
