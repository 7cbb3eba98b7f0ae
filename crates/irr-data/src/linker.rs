//! Handle-keyed side tables.
//!
//! [`Linker`] maps a key handle's index to exactly one value; [`MultiLinker`]
//! maps it to a singly linked chain of values. Both are indexed by
//! [`Handle::index`] only. Keys are not generation-checked: the owner clears
//! an entry when it frees the keyed entity.

use std::{
    iter::FusedIterator,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use crate::{
    data_array::DataArray,
    error::{StorageError, StorageResult},
    handle::{Handle, HandleRepr},
};

fn check_capacity<K: HandleRepr>(capacity: usize) -> StorageResult<()> {
    if capacity == 0 || capacity > K::MAX_CAPACITY {
        return Err(StorageError::InvalidCapacity {
            requested: capacity,
            max: K::MAX_CAPACITY,
        });
    }
    Ok(())
}

fn key_index<K: HandleRepr>(key: Handle<K>) -> usize {
    assert!(key.is_valid(), "link through invalid key {key:?}");
    key.index()
}

/// One value per key index.
#[derive(Debug)]
pub struct Linker<K: HandleRepr, V> {
    items: Vec<V>,
    _key: PhantomData<K>,
}

impl<K: HandleRepr, V> Default for Linker<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HandleRepr, V> Linker<K, V> {
    /// Create a linker with capacity 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            _key: PhantomData,
        }
    }

    /// Create a linker with `capacity` default-valued entries.
    pub fn with_capacity(capacity: usize) -> StorageResult<Self>
    where
        V: Default,
    {
        let mut linker = Self::new();
        linker.init(capacity)?;
        Ok(linker)
    }

    /// Reset to `capacity` default-valued entries.
    pub fn init(&mut self, capacity: usize) -> StorageResult<()>
    where
        V: Default,
    {
        check_capacity::<K>(capacity)?;
        self.items.clear();
        self.items.resize_with(capacity, V::default);
        Ok(())
    }

    /// Number of addressable key indices.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Store `value` for `key`, overwriting any previous value.
    ///
    /// # Panics
    ///
    /// Panics if `key` is invalid or its index is out of range.
    pub fn emplace(&mut self, key: Handle<K>, value: V) {
        self.items[key_index(key)] = value;
    }

    /// Reset the entry for `key` to the default value and return the old one.
    pub fn destroy(&mut self, key: Handle<K>) -> V
    where
        V: Default,
    {
        std::mem::take(&mut self.items[key_index(key)])
    }

    /// Value stored for `key`.
    #[must_use]
    pub fn get(&self, key: Handle<K>) -> &V {
        &self.items[key_index(key)]
    }

    /// Mutable value stored for `key`.
    #[must_use]
    pub fn get_mut(&mut self, key: Handle<K>) -> &mut V {
        &mut self.items[key_index(key)]
    }
}

impl<K: HandleRepr, R: HandleRepr> Linker<K, Handle<R>> {
    /// Follow the handle stored for `key` into `pool`.
    ///
    /// Returns `None` if nothing was linked or the target has been freed.
    #[must_use]
    pub fn try_to_get<'a, T>(&self, pool: &'a DataArray<T, R>, key: Handle<K>) -> Option<&'a T> {
        pool.try_to_get(*self.get(key))
    }
}

impl<K: HandleRepr, V> Index<Handle<K>> for Linker<K, V> {
    type Output = V;

    fn index(&self, key: Handle<K>) -> &V {
        self.get(key)
    }
}

impl<K: HandleRepr, V> IndexMut<Handle<K>> for Linker<K, V> {
    fn index_mut(&mut self, key: Handle<K>) -> &mut V {
        self.get_mut(key)
    }
}

#[derive(Debug)]
struct ChainNode<V> {
    value: V,
    next: Option<u32>,
}

/// Many values per key index.
///
/// Each key owns a singly linked chain stored in a shared node vector.
/// [`emplace`](Self::emplace) prepends, so chains read newest first. Freed
/// chain nodes are reused LIFO before the vector grows.
#[derive(Debug)]
pub struct MultiLinker<K: HandleRepr, V> {
    heads: Vec<Option<u32>>,
    nodes: Vec<ChainNode<V>>,
    free_head: Option<u32>,
    len: usize,
    _key: PhantomData<K>,
}

impl<K: HandleRepr, V> Default for MultiLinker<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HandleRepr, V> MultiLinker<K, V> {
    /// Create a multi-linker with capacity 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heads: Vec::new(),
            nodes: Vec::new(),
            free_head: None,
            len: 0,
            _key: PhantomData,
        }
    }

    /// Create a multi-linker addressing `capacity` key indices.
    pub fn with_capacity(capacity: usize) -> StorageResult<Self> {
        let mut linker = Self::new();
        linker.init(capacity)?;
        Ok(linker)
    }

    /// Reset to `capacity` empty chains. The node vector is pre-reserved for
    /// one value per key.
    pub fn init(&mut self, capacity: usize) -> StorageResult<()> {
        check_capacity::<K>(capacity)?;
        self.heads.clear();
        self.heads.resize(capacity, None);
        self.nodes = Vec::with_capacity(capacity);
        self.free_head = None;
        self.len = 0;
        Ok(())
    }

    /// Empty every chain, keeping the key capacity.
    pub fn clear(&mut self) {
        self.heads.fill(None);
        self.nodes.clear();
        self.free_head = None;
        self.len = 0;
    }

    /// Number of addressable key indices.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.heads.len()
    }

    /// Number of values across all chains.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether every chain is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `key` has at least one value.
    #[must_use]
    pub fn contains_key(&self, key: Handle<K>) -> bool {
        self.heads[key_index(key)].is_some()
    }

    /// Prepend `value` to the chain of `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is invalid or its index is out of range.
    pub fn emplace(&mut self, key: Handle<K>, value: V) {
        let index = key_index(key);
        let node = ChainNode {
            value,
            next: self.heads[index],
        };

        let position = match self.free_head {
            Some(position) => {
                let slot = &mut self.nodes[position as usize];
                self.free_head = slot.next;
                *slot = node;
                position
            }
            None => {
                let position = u32::try_from(self.nodes.len()).expect("chain node overflow");
                self.nodes.push(node);
                position
            }
        };

        self.heads[index] = Some(position);
        self.len += 1;
    }

    /// Release the whole chain of `key`. Returns the number of values removed.
    ///
    /// Nodes go onto the free list in chain order, so the last node of the
    /// chain is the first one reused.
    pub fn destroy(&mut self, key: Handle<K>) -> usize {
        let index = key_index(key);
        let mut cursor = self.heads[index].take();
        let mut removed = 0;

        while let Some(position) = cursor {
            cursor = self.release(position);
            removed += 1;
        }

        removed
    }

    /// Values linked to `key`, newest first. Does not validate anything.
    pub fn values(&self, key: Handle<K>) -> Values<'_, V> {
        Values {
            nodes: &self.nodes,
            cursor: self.heads[key_index(key)],
        }
    }

    /// Puts `position` on the free list and returns its old successor.
    fn release(&mut self, position: u32) -> Option<u32> {
        let node = &mut self.nodes[position as usize];
        let next = std::mem::replace(&mut node.next, self.free_head);
        self.free_head = Some(position);
        self.len -= 1;
        next
    }
}

impl<K: HandleRepr, R: HandleRepr> MultiLinker<K, Handle<R>> {
    /// Validating view over the handles linked to `key`.
    ///
    /// Yields `(handle, &value)` for each target still live in `pool`;
    /// chain nodes whose target was freed are unlinked and recycled, the
    /// chain head included.
    pub fn get_view<'a, 'p, T>(
        &'a mut self,
        key: Handle<K>,
        pool: &'p DataArray<T, R>,
    ) -> View<'a, 'p, K, T, R> {
        let key_index = key_index(key);
        View {
            cursor: self.heads[key_index],
            previous: None,
            key_index,
            linker: self,
            pool,
        }
    }
}

/// Iterator over the raw values of one [`MultiLinker`] chain.
pub struct Values<'a, V> {
    nodes: &'a [ChainNode<V>],
    cursor: Option<u32>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        let node = &self.nodes[self.cursor? as usize];
        self.cursor = node.next;
        Some(&node.value)
    }
}

impl<V> FusedIterator for Values<'_, V> {}

/// Pruning iterator returned by [`MultiLinker::get_view`].
pub struct View<'a, 'p, K: HandleRepr, T, R: HandleRepr> {
    linker: &'a mut MultiLinker<K, Handle<R>>,
    pool: &'p DataArray<T, R>,
    key_index: usize,
    previous: Option<u32>,
    cursor: Option<u32>,
}

impl<'p, K: HandleRepr, T, R: HandleRepr> Iterator for View<'_, 'p, K, T, R> {
    type Item = (Handle<R>, &'p T);

    fn next(&mut self) -> Option<Self::Item> {
        let pool: &'p DataArray<T, R> = self.pool;

        loop {
            let position = self.cursor?;
            let node = &self.linker.nodes[position as usize];
            let (target, next) = (node.value, node.next);

            if let Some(value) = pool.try_to_get(target) {
                self.previous = Some(position);
                self.cursor = next;
                return Some((target, value));
            }

            tracing::trace!(%target, node = position, "pruning dead link");
            match self.previous {
                Some(previous) => self.linker.nodes[previous as usize].next = next,
                None => self.linker.heads[self.key_index] = next,
            }
            self.linker.release(position);
            self.cursor = next;
        }
    }
}

impl<K: HandleRepr, T, R: HandleRepr> FusedIterator for View<'_, '_, K, T, R> {}
