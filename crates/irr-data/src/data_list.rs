//! Intrusive relation lists.
//!
//! An entity that owns an ordered set of handles into another pool embeds an
//! [`IdList`], which is only a `(first, last)` pair of node positions. The
//! nodes themselves live in a shared [`DataList`] node pool, so thousands of
//! small relation lists cost no per-list heap allocation.
//!
//! ```text
//! Node { children: IdList { first: 4, last: 1 } }
//!
//! DataList nodes:   [1] ◄──► [4] ◄──► ... ◄──► [1]
//!                   target: Id(2v9)   target: Id(0v3)
//! ```
//!
//! Lists never observe frees in the pool their handles point into. A
//! validating walk ([`IdList::iter`]) checks each target with
//! [`DataArray::try_to_get`] and unlinks dead nodes in place, so a list
//! shrinks lazily the next time it is traversed.
//!
//! Node positions are plain indices, not generation-checked: a node is only
//! ever reached through the single list that owns it.

use std::{iter::FusedIterator, marker::PhantomData};

use crate::{
    data_array::DataArray,
    error::{StorageError, StorageResult},
    handle::{Handle, HandleRepr},
};

#[derive(Clone, Copy, Debug)]
struct Node<R: HandleRepr> {
    target: Handle<R>,
    previous: Option<u32>,
    next: Option<u32>,
}

impl<R: HandleRepr> Node<R> {
    const fn vacant(next_free: Option<u32>) -> Self {
        Self {
            target: Handle::INVALID,
            previous: None,
            next: next_free,
        }
    }
}

/// Shared node pool backing any number of [`IdList`]s.
///
/// Free nodes are chained through their `next` link and reused LIFO.
#[derive(Debug)]
pub struct DataList<R: HandleRepr = u32> {
    nodes: Vec<Node<R>>,
    capacity: usize,
    len: usize,
    free_head: Option<u32>,
}

impl<R: HandleRepr> Default for DataList<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: HandleRepr> DataList<R> {
    /// Largest node count addressable by a `u32` node position.
    pub const MAX_CAPACITY: usize = u32::MAX as usize;

    /// Create an empty node pool with capacity 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            capacity: 0,
            len: 0,
            free_head: None,
        }
    }

    /// Create a node pool able to hold `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> StorageResult<Self> {
        let mut list = Self::new();
        list.init(capacity)?;
        Ok(list)
    }

    /// Reset the pool to `capacity` free nodes.
    ///
    /// Every [`IdList`] that pointed into the pool must be discarded.
    pub fn init(&mut self, capacity: usize) -> StorageResult<()> {
        if capacity == 0 || capacity > Self::MAX_CAPACITY {
            return Err(StorageError::InvalidCapacity {
                requested: capacity,
                max: Self::MAX_CAPACITY,
            });
        }

        self.clear();
        self.nodes = Vec::with_capacity(capacity);
        self.capacity = capacity;
        tracing::trace!(capacity, "data list initialised");
        Ok(())
    }

    /// Release every node and the storage.
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
        self.capacity = 0;
        self.len = 0;
        self.free_head = None;
    }

    /// Number of nodes in use across all lists.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no node is in use.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed node capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether no node is available.
    #[must_use]
    pub fn full(&self) -> bool {
        self.free_head.is_none() && self.nodes.len() == self.capacity
    }

    fn alloc(&mut self, target: Handle<R>) -> StorageResult<u32> {
        let node = Node {
            target,
            previous: None,
            next: None,
        };

        if let Some(position) = self.free_head {
            let slot = &mut self.nodes[position as usize];
            self.free_head = slot.next;
            *slot = node;
            self.len += 1;
            return Ok(position);
        }

        if self.nodes.len() < self.capacity {
            let position = self.nodes.len() as u32;
            self.nodes.push(node);
            self.len += 1;
            return Ok(position);
        }

        tracing::debug!(capacity = self.capacity, "data list exhausted");
        Err(StorageError::CapacityExhausted {
            capacity: self.capacity,
        })
    }

    fn release(&mut self, position: u32) {
        self.nodes[position as usize] = Node::vacant(self.free_head);
        self.free_head = Some(position);
        self.len -= 1;
    }

    #[inline]
    fn node(&self, position: u32) -> &Node<R> {
        &self.nodes[position as usize]
    }

    #[inline]
    fn node_mut(&mut self, position: u32) -> &mut Node<R> {
        &mut self.nodes[position as usize]
    }
}

/// A list of handles stored in a [`DataList`].
///
/// The descriptor is two node positions and is meant to be embedded in the
/// owning entity. Every operation takes the node pool explicitly; using a
/// list with a pool other than the one it was filled from is a contract
/// violation.
///
/// `IdList` is deliberately not `Clone`: two descriptors sharing nodes would
/// corrupt each other on the first unlink.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IdList<R: HandleRepr = u32> {
    first: Option<u32>,
    last: Option<u32>,
    _repr: PhantomData<R>,
}

impl<R: HandleRepr> IdList<R> {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first: None,
            last: None,
            _repr: PhantomData,
        }
    }

    /// Whether the list has no node. Dead targets still count until a
    /// validating walk prunes them.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Number of nodes, counting dead targets not yet pruned. O(n).
    #[must_use]
    pub fn len(&self, nodes: &DataList<R>) -> usize {
        self.handles(nodes).count()
    }

    /// First handle, without validation.
    #[must_use]
    pub fn front(&self, nodes: &DataList<R>) -> Option<Handle<R>> {
        self.first.map(|position| nodes.node(position).target)
    }

    /// Last handle, without validation.
    #[must_use]
    pub fn back(&self, nodes: &DataList<R>) -> Option<Handle<R>> {
        self.last.map(|position| nodes.node(position).target)
    }

    /// Whether `target` is stored in the list.
    #[must_use]
    pub fn contains(&self, nodes: &DataList<R>, target: Handle<R>) -> bool {
        self.handles(nodes).any(|handle| handle == target)
    }

    /// Prepend `target`.
    pub fn push_front(&mut self, nodes: &mut DataList<R>, target: Handle<R>) -> StorageResult<()> {
        let position = nodes.alloc(target)?;
        match self.first {
            Some(first) => {
                nodes.node_mut(position).next = Some(first);
                nodes.node_mut(first).previous = Some(position);
                self.first = Some(position);
            }
            None => {
                self.first = Some(position);
                self.last = Some(position);
            }
        }
        Ok(())
    }

    /// Append `target`.
    pub fn push_back(&mut self, nodes: &mut DataList<R>, target: Handle<R>) -> StorageResult<()> {
        let position = nodes.alloc(target)?;
        match self.last {
            Some(last) => {
                nodes.node_mut(position).previous = Some(last);
                nodes.node_mut(last).next = Some(position);
                self.last = Some(position);
            }
            None => {
                self.first = Some(position);
                self.last = Some(position);
            }
        }
        Ok(())
    }

    /// Remove and return the first handle.
    pub fn pop_front(&mut self, nodes: &mut DataList<R>) -> Option<Handle<R>> {
        let position = self.first?;
        let target = nodes.node(position).target;
        self.unlink(nodes, position);
        Some(target)
    }

    /// Remove and return the last handle.
    pub fn pop_back(&mut self, nodes: &mut DataList<R>) -> Option<Handle<R>> {
        let position = self.last?;
        let target = nodes.node(position).target;
        self.unlink(nodes, position);
        Some(target)
    }

    /// Remove the node under `cursor` and return the cursor from which
    /// [`Cursor::move_next`] continues the walk.
    ///
    /// Erasing the first node yields the before-first position, erasing the
    /// last node yields the end position, otherwise the previous node.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` is at a sentinel position.
    pub fn erase(&mut self, nodes: &mut DataList<R>, cursor: Cursor) -> Cursor {
        let Position::At(position) = cursor.0 else {
            panic!("erase at sentinel cursor {cursor:?}");
        };

        let previous = nodes.node(position).previous;
        let was_first = self.first == Some(position);
        let was_last = self.last == Some(position);
        self.unlink(nodes, position);

        if was_first {
            Cursor(Position::BeforeFirst)
        } else if was_last {
            Cursor(Position::End)
        } else {
            Cursor(previous.map_or(Position::BeforeFirst, Position::At))
        }
    }

    /// Free every node.
    pub fn clear(&mut self, nodes: &mut DataList<R>) {
        let mut cursor = self.first;
        while let Some(position) = cursor {
            cursor = nodes.node(position).next;
            nodes.release(position);
        }
        self.first = None;
        self.last = None;
    }

    /// Remove every node whose handle satisfies `predicate`.
    ///
    /// ```
    /// # use irr_data::{DataArray, DataList, IdList};
    /// let mut pool = DataArray::<u32>::with_capacity(4).unwrap();
    /// let mut nodes = DataList::with_capacity(4).unwrap();
    /// let mut list = IdList::new();
    ///
    /// let a = pool.alloc(1).unwrap();
    /// let b = pool.alloc(2).unwrap();
    /// list.push_back(&mut nodes, a).unwrap();
    /// list.push_back(&mut nodes, b).unwrap();
    ///
    /// pool.free(a);
    /// list.clear_if(&mut nodes, |handle| !pool.contains(handle));
    /// assert_eq!(list.front(&nodes), Some(b));
    /// assert_eq!(list.len(&nodes), 1);
    /// ```
    pub fn clear_if(&mut self, nodes: &mut DataList<R>, mut predicate: impl FnMut(Handle<R>) -> bool) {
        let mut cursor = self.begin();
        while let Some(target) = cursor.get(nodes) {
            if predicate(target) {
                cursor = self.erase(nodes, cursor);
            }
            cursor.move_next(self, nodes);
        }
    }

    // ==================== Cursors ====================

    /// Cursor at the first node, or the end position if empty.
    #[must_use]
    pub fn begin(&self) -> Cursor {
        Cursor(self.first.map_or(Position::End, Position::At))
    }

    /// Past-the-end position.
    #[must_use]
    pub const fn end(&self) -> Cursor {
        Cursor(Position::End)
    }

    /// Cursor at the last node, or the before-first position if empty.
    #[must_use]
    pub fn rbegin(&self) -> Cursor {
        Cursor(self.last.map_or(Position::BeforeFirst, Position::At))
    }

    /// Before-first position.
    #[must_use]
    pub const fn rend(&self) -> Cursor {
        Cursor(Position::BeforeFirst)
    }

    // ==================== Iteration ====================

    /// Walk the stored handles without validation.
    pub fn handles<'a>(&self, nodes: &'a DataList<R>) -> Handles<'a, R> {
        Handles {
            nodes,
            front: self.first,
            back: self.last,
        }
    }

    /// Walk the live targets, pruning dead nodes on the way.
    ///
    /// Each node's handle is validated against `pool` before it is yielded;
    /// a handle that fails validation has its node unlinked and freed, and
    /// the walk moves on. Works from both ends.
    pub fn iter<'a, 'p, T>(
        &'a mut self,
        nodes: &'a mut DataList<R>,
        pool: &'p DataArray<T, R>,
    ) -> Iter<'a, 'p, T, R> {
        Iter {
            front: self.first,
            back: self.last,
            list: self,
            nodes,
            pool,
        }
    }

    /// Prune dead nodes without yielding anything. Returns the number of live
    /// targets left.
    pub fn prune<T>(&mut self, nodes: &mut DataList<R>, pool: &DataArray<T, R>) -> usize {
        self.iter(nodes, pool).count()
    }

    fn unlink(&mut self, nodes: &mut DataList<R>, position: u32) {
        let Node { previous, next, .. } = *nodes.node(position);

        match previous {
            Some(previous) => nodes.node_mut(previous).next = next,
            None => {
                debug_assert_eq!(self.first, Some(position), "node not owned by this list");
                self.first = next;
            }
        }
        match next {
            Some(next) => nodes.node_mut(next).previous = previous,
            None => {
                debug_assert_eq!(self.last, Some(position), "node not owned by this list");
                self.last = previous;
            }
        }

        nodes.release(position);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    At(u32),
    End,
}

/// Bidirectional, non-validating position in an [`IdList`].
///
/// Moving past either end is well defined: the cursor stays on the
/// sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor(Position);

impl Cursor {
    /// Handle under the cursor, `None` at a sentinel.
    #[must_use]
    pub fn get<R: HandleRepr>(self, nodes: &DataList<R>) -> Option<Handle<R>> {
        match self.0 {
            Position::At(position) => Some(nodes.node(position).target),
            Position::BeforeFirst | Position::End => None,
        }
    }

    /// Step towards the back.
    pub fn move_next<R: HandleRepr>(&mut self, list: &IdList<R>, nodes: &DataList<R>) {
        self.0 = match self.0 {
            Position::BeforeFirst => list.first.map_or(Position::End, Position::At),
            Position::At(position) => nodes.node(position).next.map_or(Position::End, Position::At),
            Position::End => Position::End,
        };
    }

    /// Step towards the front.
    pub fn move_prev<R: HandleRepr>(&mut self, list: &IdList<R>, nodes: &DataList<R>) {
        self.0 = match self.0 {
            Position::End => list.last.map_or(Position::BeforeFirst, Position::At),
            Position::At(position) => nodes
                .node(position)
                .previous
                .map_or(Position::BeforeFirst, Position::At),
            Position::BeforeFirst => Position::BeforeFirst,
        };
    }

    /// Whether the cursor is past the last node.
    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(self.0, Position::End)
    }

    /// Whether the cursor is before the first node.
    #[must_use]
    pub const fn is_before_first(self) -> bool {
        matches!(self.0, Position::BeforeFirst)
    }
}

/// Non-validating iterator over the handles of an [`IdList`].
pub struct Handles<'a, R: HandleRepr> {
    nodes: &'a DataList<R>,
    front: Option<u32>,
    back: Option<u32>,
}

impl<R: HandleRepr> Iterator for Handles<'_, R> {
    type Item = Handle<R>;

    fn next(&mut self) -> Option<Handle<R>> {
        let position = self.front?;
        let node = self.nodes.node(position);
        if self.back == Some(position) {
            self.front = None;
            self.back = None;
        } else {
            self.front = node.next;
        }
        Some(node.target)
    }
}

impl<R: HandleRepr> DoubleEndedIterator for Handles<'_, R> {
    fn next_back(&mut self) -> Option<Handle<R>> {
        let position = self.back?;
        let node = self.nodes.node(position);
        if self.front == Some(position) {
            self.front = None;
            self.back = None;
        } else {
            self.back = node.previous;
        }
        Some(node.target)
    }
}

impl<R: HandleRepr> FusedIterator for Handles<'_, R> {}

/// Validating, pruning iterator over an [`IdList`].
///
/// Yields `(handle, &value)` for every live target; dead nodes met on the way
/// are unlinked from the list and returned to the node pool.
pub struct Iter<'a, 'p, T, R: HandleRepr> {
    list: &'a mut IdList<R>,
    nodes: &'a mut DataList<R>,
    pool: &'p DataArray<T, R>,
    front: Option<u32>,
    back: Option<u32>,
}

impl<T, R: HandleRepr> Iter<'_, '_, T, R> {
    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }

    fn drop_dead(&mut self, position: u32, target: Handle<R>) {
        tracing::trace!(%target, node = position, "pruning dead relation node");
        self.list.unlink(self.nodes, position);
    }
}

impl<'p, T, R: HandleRepr> Iterator for Iter<'_, 'p, T, R> {
    type Item = (Handle<R>, &'p T);

    fn next(&mut self) -> Option<Self::Item> {
        let pool: &'p DataArray<T, R> = self.pool;

        loop {
            let position = self.front?;
            let Node { target, next, .. } = *self.nodes.node(position);
            let at_back = self.back == Some(position);

            if let Some(value) = pool.try_to_get(target) {
                if at_back {
                    self.finish();
                } else {
                    self.front = next;
                }
                return Some((target, value));
            }

            self.drop_dead(position, target);
            if at_back {
                self.finish();
                return None;
            }
            self.front = next;
        }
    }
}

impl<'p, T, R: HandleRepr> DoubleEndedIterator for Iter<'_, 'p, T, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let pool: &'p DataArray<T, R> = self.pool;

        loop {
            let position = self.back?;
            let Node {
                target, previous, ..
            } = *self.nodes.node(position);
            let at_front = self.front == Some(position);

            if let Some(value) = pool.try_to_get(target) {
                if at_front {
                    self.finish();
                } else {
                    self.back = previous;
                }
                return Some((target, value));
            }

            self.drop_dead(position, target);
            if at_front {
                self.finish();
                return None;
            }
            self.back = previous;
        }
    }
}

impl<T, R: HandleRepr> FusedIterator for Iter<'_, '_, T, R> {}
