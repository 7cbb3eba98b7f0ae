//! Slotted pool with generation-checked handles.
//!
//! [`DataArray`] is a fixed-capacity, homogeneous object pool. Values live in
//! a contiguous `Vec` that is reserved once at `init` and never grows past
//! it, so handles stay valid across the whole pool lifetime and allocation
//! never touches the heap.
//!
//! ```text
//! slots:   [ Occupied(3v4) | Vacant(next: 3) | Occupied(2v2) | Vacant(next: -) ]
//!                                ▲
//! free_head ─────────────────────┘        high_water_mark = slots.len() = 4
//! ```
//!
//! Free slots carry the link to the next free slot in place of the handle,
//! so the free list costs no extra memory and is reused LIFO. Every `alloc`
//! mints a fresh generation from a pool-wide counter, so a handle captured
//! before a `free` never matches the slot's next occupant.

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::{
    error::{StorageError, StorageResult},
    handle::{Handle, HandleRepr, next_generation},
};

/// One storage position of a [`DataArray`].
enum Slot<T, R: HandleRepr> {
    /// Live value and the handle issued for it.
    Occupied { value: T, handle: Handle<R> },
    /// Free position; link to the next free position.
    Vacant { next_free: Option<u32> },
}

impl<T, R: HandleRepr> Slot<T, R> {
    #[inline]
    fn occupied(&self) -> Option<(Handle<R>, &T)> {
        match self {
            Self::Occupied { value, handle } => Some((*handle, value)),
            Self::Vacant { .. } => None,
        }
    }

    #[inline]
    fn occupied_mut(&mut self) -> Option<(Handle<R>, &mut T)> {
        match self {
            Self::Occupied { value, handle } => Some((*handle, value)),
            Self::Vacant { .. } => None,
        }
    }
}

/// A capacity-bounded object pool keyed by [`Handle`].
///
/// - O(1) `alloc`/`free`, LIFO reuse of freed slots
/// - stable indices, no compaction
/// - weak references through [`try_to_get`](Self::try_to_get)
///
/// `R` selects the handle width (`u32` for [`Id`](crate::Id), `u64` for
/// [`Wid`](crate::Wid)).
///
/// Not synchronised: a pool must have a single writer.
pub struct DataArray<T, R: HandleRepr = u32> {
    /// Storage; `slots.len()` is the high-water mark.
    slots: Vec<Slot<T, R>>,
    /// Fixed capacity set by `init`.
    capacity: usize,
    /// Number of live values.
    len: usize,
    /// Generation given to the next allocation, never 0.
    next_key: u32,
    /// Most recently freed slot.
    free_head: Option<u32>,
}

impl<T, R: HandleRepr> Default for DataArray<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R: HandleRepr> DataArray<T, R> {
    /// Create an empty pool with capacity 0. Call [`init`](Self::init) before
    /// allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            capacity: 0,
            len: 0,
            next_key: 1,
            free_head: None,
        }
    }

    /// Create a pool able to hold `capacity` values.
    pub fn with_capacity(capacity: usize) -> StorageResult<Self> {
        let mut pool = Self::new();
        pool.init(capacity)?;
        Ok(pool)
    }

    /// Drop every live value and reserve room for `capacity` values.
    ///
    /// Fails if `capacity` exceeds [`HandleRepr::MAX_CAPACITY`]; the pool is
    /// left empty with capacity 0 in that case.
    pub fn init(&mut self, capacity: usize) -> StorageResult<()> {
        self.clear();

        if capacity > R::MAX_CAPACITY {
            return Err(StorageError::InvalidCapacity {
                requested: capacity,
                max: R::MAX_CAPACITY,
            });
        }

        self.slots = Vec::with_capacity(capacity);
        self.capacity = capacity;
        tracing::trace!(capacity, handle = R::NAME, "data array initialised");
        Ok(())
    }

    /// Drop every live value and release the storage. Capacity becomes 0 and
    /// the generation counter restarts at 1.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.capacity = 0;
        self.len = 0;
        self.next_key = 1;
        self.free_head = None;
    }

    // ==================== Allocation ====================

    /// Store `value` and return its handle.
    pub fn alloc(&mut self, value: T) -> StorageResult<Handle<R>> {
        self.alloc_with(|_| value)
    }

    /// Store the value built by `make`, which receives the handle the value
    /// will be reachable through.
    pub fn alloc_with(&mut self, make: impl FnOnce(Handle<R>) -> T) -> StorageResult<Handle<R>> {
        let index = self.claim_slot()?;
        let handle = Handle::new(self.next_key, index as u32);
        self.next_key = next_generation::<R>(self.next_key);

        let slot = Slot::Occupied {
            value: make(handle),
            handle,
        };
        if index == self.slots.len() {
            self.slots.push(slot);
        } else {
            self.slots[index] = slot;
        }
        self.len += 1;

        Ok(handle)
    }

    /// Store `value` and return its handle together with a mutable reference.
    pub fn alloc_mut(&mut self, value: T) -> StorageResult<(Handle<R>, &mut T)> {
        let handle = self.alloc(value)?;
        Ok((handle, self.get_mut(handle)))
    }

    /// Store `T::default()` and return its handle.
    pub fn alloc_default(&mut self) -> StorageResult<Handle<R>>
    where
        T: Default,
    {
        self.alloc_with(|_| T::default())
    }

    /// Pick the slot for the next allocation: free list first, then bump.
    fn claim_slot(&mut self) -> StorageResult<usize> {
        if let Some(index) = self.free_head {
            let index = index as usize;
            match self.slots[index] {
                Slot::Vacant { next_free } => self.free_head = next_free,
                Slot::Occupied { handle, .. } => {
                    unreachable!("free list reaches live slot {index} ({handle:?})")
                }
            }
            return Ok(index);
        }

        if self.slots.len() < self.capacity {
            return Ok(self.slots.len());
        }

        tracing::debug!(capacity = self.capacity, "data array exhausted");
        Err(StorageError::CapacityExhausted {
            capacity: self.capacity,
        })
    }

    /// Remove the value named by `handle` and return it.
    ///
    /// The slot goes to the front of the free list. Dropping the returned
    /// value runs its destructor.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not live in this pool: freeing twice, freeing an
    /// invalid handle or freeing a handle from another pool are programming
    /// errors.
    pub fn free(&mut self, handle: Handle<R>) -> T {
        assert!(handle.is_valid(), "free of invalid handle {handle:?}");

        let index = handle.index();
        let Some(slot) = self.slots.get_mut(index) else {
            panic!("free of {handle:?}: index beyond high-water mark");
        };
        let Slot::Occupied { handle: stored, .. } = slot else {
            panic!("double free of {handle:?}");
        };
        assert_eq!(*stored, handle, "free of stale handle");

        let old = std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(index as u32);
        self.len -= 1;

        match old {
            Slot::Occupied { value, .. } => value,
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    // ==================== Access ====================

    /// Value named by `handle`, or `None` if the handle is invalid or the
    /// slot no longer holds exactly that handle.
    ///
    /// This is the only safe way to dereference a handle that may have
    /// outlived its value.
    #[inline]
    #[must_use]
    pub fn try_to_get(&self, handle: Handle<R>) -> Option<&T> {
        if !handle.is_valid() {
            return None;
        }
        match self.slots.get(handle.index())? {
            Slot::Occupied {
                value,
                handle: stored,
            } if *stored == handle => Some(value),
            _ => None,
        }
    }

    /// Mutable counterpart of [`try_to_get`](Self::try_to_get).
    #[inline]
    #[must_use]
    pub fn try_to_get_mut(&mut self, handle: Handle<R>) -> Option<&mut T> {
        if !handle.is_valid() {
            return None;
        }
        match self.slots.get_mut(handle.index())? {
            Slot::Occupied {
                value,
                handle: stored,
            } if *stored == handle => Some(value),
            _ => None,
        }
    }

    /// Whether `handle` currently names a live value.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle<R>) -> bool {
        self.try_to_get(handle).is_some()
    }

    /// Value named by `handle`, for callers that already know it is live.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free or out of range. A generation mismatch is
    /// only caught in debug builds.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle<R>) -> &T {
        match &self.slots[handle.index()] {
            Slot::Occupied {
                value,
                handle: stored,
            } => {
                debug_assert_eq!(*stored, handle, "unchecked access through stale handle");
                value
            }
            Slot::Vacant { .. } => panic!("unchecked access to free slot through {handle:?}"),
        }
    }

    /// Mutable counterpart of [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Same contract as [`get`](Self::get).
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, handle: Handle<R>) -> &mut T {
        match &mut self.slots[handle.index()] {
            Slot::Occupied {
                value,
                handle: stored,
            } => {
                debug_assert_eq!(*stored, handle, "unchecked access through stale handle");
                value
            }
            Slot::Vacant { .. } => panic!("unchecked access to free slot through {handle:?}"),
        }
    }

    /// Handle of a value borrowed from this pool.
    ///
    /// Returns `None` if `value` does not live in this pool.
    #[must_use]
    pub fn get_id(&self, value: &T) -> Option<Handle<R>> {
        let base = self.slots.as_ptr().addr();
        let addr = std::ptr::from_ref(value).addr();
        let index = addr.checked_sub(base)? / size_of::<Slot<T, R>>();

        match self.slots.get(index)? {
            Slot::Occupied {
                value: stored,
                handle,
            } if std::ptr::eq(stored, value) => Some(*handle),
            _ => None,
        }
    }

    // ==================== Traversal ====================

    /// Restartable cursor scan over live values.
    ///
    /// `next(None)` returns the first live value; `next(Some(h))` returns the
    /// first live value stored after `h`'s slot. Free slots are skipped and
    /// the scan ends at the high-water mark.
    ///
    /// ```
    /// # use irr_data::DataArray;
    /// let mut pool = DataArray::<&str>::with_capacity(4).unwrap();
    /// pool.alloc("a").unwrap();
    /// pool.alloc("b").unwrap();
    ///
    /// let mut cursor = None;
    /// let mut seen = Vec::new();
    /// while let Some((handle, value)) = pool.next(cursor) {
    ///     seen.push(*value);
    ///     cursor = Some(handle);
    /// }
    /// assert_eq!(seen, ["a", "b"]);
    /// ```
    #[must_use]
    pub fn next(&self, cursor: Option<Handle<R>>) -> Option<(Handle<R>, &T)> {
        let start = cursor.map_or(0, |handle| handle.index() + 1);
        self.slots.get(start..)?.iter().find_map(Slot::occupied)
    }

    /// Iterate over live values in slot order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Handle<R>, &T)> {
        self.slots.iter().filter_map(Slot::occupied)
    }

    /// Iterate mutably over live values in slot order.
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = (Handle<R>, &mut T)> {
        self.slots.iter_mut().filter_map(Slot::occupied_mut)
    }

    /// Handles of all live values in slot order.
    pub fn handles(&self) -> impl DoubleEndedIterator<Item = Handle<R>> {
        self.iter().map(|(handle, _)| handle)
    }

    // ==================== Counters ====================

    /// Whether no slot is available for `alloc`.
    #[inline]
    #[must_use]
    pub fn full(&self) -> bool {
        self.free_head.is_none() && self.slots.len() == self.capacity
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the pool holds no live value.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed capacity set by `init`.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots ever used since `init`.
    #[inline]
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.slots.len()
    }
}

impl<T, R: HandleRepr> Index<Handle<R>> for DataArray<T, R> {
    type Output = T;

    fn index(&self, handle: Handle<R>) -> &T {
        self.get(handle)
    }
}

impl<T, R: HandleRepr> IndexMut<Handle<R>> for DataArray<T, R> {
    fn index_mut(&mut self, handle: Handle<R>) -> &mut T {
        self.get_mut(handle)
    }
}

impl<T, R: HandleRepr> fmt::Debug for DataArray<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataArray")
            .field("len", &self.len)
            .field("high_water_mark", &self.slots.len())
            .field("capacity", &self.capacity)
            .field("next_key", &self.next_key)
            .field("free_head", &self.free_head)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::handle::{Id, Wid};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
    }

    /// Walk the free list and check the slot invariants.
    fn check_invariants<T, R: HandleRepr>(pool: &DataArray<T, R>) {
        assert!(pool.len() <= pool.high_water_mark());
        assert!(pool.high_water_mark() <= pool.capacity());

        let mut free = 0;
        let mut cursor = pool.free_head;
        while let Some(index) = cursor {
            let index = index as usize;
            assert!(index < pool.high_water_mark());
            free += 1;
            assert!(free <= pool.high_water_mark(), "free list has a cycle");
            match pool.slots[index] {
                Slot::Vacant { next_free } => cursor = next_free,
                Slot::Occupied { .. } => panic!("free list reaches live slot {index}"),
            }
        }
        assert_eq!(free + pool.len(), pool.high_water_mark());

        for (position, slot) in pool.slots.iter().enumerate() {
            if let Slot::Occupied { handle, .. } = slot {
                assert!(handle.is_valid());
                assert_eq!(handle.index(), position);
            }
        }
    }

    #[test]
    fn test_empty_pool() {
        let pool = DataArray::<Position>::new();
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), 0);
        assert_eq!(pool.high_water_mark(), 0);
        assert_eq!(pool.next_key, 1);
        assert!(pool.free_head.is_none());
        assert!(pool.full());
    }

    #[test]
    fn test_bump_allocation_counters() {
        let mut pool = DataArray::<Position>::with_capacity(3).unwrap();
        assert_eq!(pool.capacity(), 3);
        assert!(!pool.full());

        let first = pool.alloc(Position { x: 0.0 }).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.high_water_mark(), 1);
        assert_eq!(pool.next_key, 2);
        assert_eq!(first.index(), 0);
        assert_eq!(first.generation(), 1);

        pool.alloc(Position { x: 1.0 }).unwrap();
        pool.alloc(Position { x: 2.0 }).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.high_water_mark(), 3);
        assert_eq!(pool.next_key, 4);
        assert!(pool.full());
        check_invariants(&pool);

        pool.clear();
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), 0);
        assert_eq!(pool.next_key, 1);
        assert!(pool.free_head.is_none());
    }

    #[test]
    fn test_roundtrip_after_alloc() {
        let mut pool = DataArray::<Position>::with_capacity(8).unwrap();
        for i in 0..8 {
            let value = Position { x: i as f32 };
            let handle = pool.alloc(value).unwrap();
            assert_eq!(pool.try_to_get(handle), Some(&value));
            assert_eq!(pool.get_id(pool.get(handle)), Some(handle));
        }
    }

    #[test]
    fn test_lifo_reuse_with_fresh_generations() {
        let mut pool = DataArray::<Position>::with_capacity(3).unwrap();
        let h1 = pool.alloc(Position { x: 1.0 }).unwrap();
        let h2 = pool.alloc(Position { x: 2.0 }).unwrap();
        let h3 = pool.alloc(Position { x: 3.0 }).unwrap();

        pool.free(h1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.free_head, Some(0));
        pool.free(h2);
        assert_eq!(pool.free_head, Some(1));
        pool.free(h3);
        assert_eq!(pool.free_head, Some(2));
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.high_water_mark(), 3);
        check_invariants(&pool);

        let n1 = pool.alloc_default().unwrap();
        let n2 = pool.alloc_default().unwrap();
        let n3 = pool.alloc_default().unwrap();

        assert_eq!(n1.index(), 2);
        assert_eq!(n2.index(), 1);
        assert_eq!(n3.index(), 0);
        assert_eq!(pool.next_key, 7);
        assert!(pool.free_head.is_none());

        for (old, new) in [(h1, n3), (h2, n2), (h3, n1)] {
            assert_eq!(old.index(), new.index());
            assert_ne!(old.generation(), new.generation());
            assert!(pool.try_to_get(old).is_none());
        }
        check_invariants(&pool);
    }

    #[test]
    fn test_alloc_fails_when_full() {
        let mut pool = DataArray::<u32>::with_capacity(2).unwrap();
        pool.alloc(1).unwrap();
        pool.alloc(2).unwrap();
        assert!(pool.full());
        assert_eq!(
            pool.alloc(3),
            Err(StorageError::CapacityExhausted { capacity: 2 })
        );
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_zero_capacity_pool_is_full() {
        let mut pool = DataArray::<u32>::with_capacity(0).unwrap();
        assert!(pool.full());
        assert!(pool.alloc(1).is_err());
    }

    #[test]
    fn test_init_rejects_capacity_beyond_handle_width() {
        let result = DataArray::<u8, u32>::with_capacity(70_000);
        assert_eq!(
            result.unwrap_err(),
            StorageError::InvalidCapacity {
                requested: 70_000,
                max: 65_535
            }
        );
        assert!(DataArray::<u8, u32>::with_capacity(65_535).is_ok());
        assert!(DataArray::<u8, u64>::with_capacity(70_000).is_ok());
    }

    #[test]
    fn test_init_resets_live_values() {
        let marker = Rc::new(());
        let mut pool = DataArray::<Rc<()>>::with_capacity(4).unwrap();
        let handle = pool.alloc(Rc::clone(&marker)).unwrap();
        assert_eq!(Rc::strong_count(&marker), 2);

        pool.init(2).unwrap();
        assert_eq!(Rc::strong_count(&marker), 1);
        assert_eq!(pool.capacity(), 2);
        assert!(pool.try_to_get(handle).is_none());
    }

    #[test]
    fn test_free_returns_value_and_runs_drop() {
        let marker = Rc::new(());
        let mut pool = DataArray::<Rc<()>>::with_capacity(2).unwrap();
        let a = pool.alloc(Rc::clone(&marker)).unwrap();
        pool.alloc(Rc::clone(&marker)).unwrap();
        assert_eq!(Rc::strong_count(&marker), 3);

        drop(pool.free(a));
        assert_eq!(Rc::strong_count(&marker), 2);

        drop(pool);
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn test_stale_and_invalid_handles_fail_lookup() {
        let mut pool = DataArray::<u32>::with_capacity(4).unwrap();
        let handle = pool.alloc(10).unwrap();
        assert!(pool.try_to_get(Id::INVALID).is_none());
        assert!(pool.try_to_get(Id::new(1, 3)).is_none());
        assert!(pool.try_to_get(Id::new(9, 0)).is_none());

        pool.free(handle);
        assert!(pool.try_to_get(handle).is_none());
        assert!(pool.try_to_get_mut(handle).is_none());
        assert!(!pool.contains(handle));
    }

    #[test]
    fn test_alloc_with_sees_own_handle() {
        let mut pool = DataArray::<Id>::with_capacity(2).unwrap();
        let handle = pool.alloc_with(|me| me).unwrap();
        assert_eq!(pool[handle], handle);
    }

    #[test]
    fn test_alloc_mut_and_index_mut() {
        let mut pool = DataArray::<Position>::with_capacity(2).unwrap();
        let (handle, value) = pool.alloc_mut(Position::default()).unwrap();
        value.x = 4.0;
        pool[handle].x += 1.0;
        assert_eq!(pool.get(handle).x, 5.0);
        if let Some(value) = pool.try_to_get_mut(handle) {
            value.x = 7.0;
        }
        assert_eq!(pool[handle].x, 7.0);
    }

    #[test]
    fn test_get_id_rejects_foreign_reference() {
        let mut pool = DataArray::<u64>::with_capacity(2).unwrap();
        pool.alloc(1).unwrap();
        let outsider = 1u64;
        assert!(pool.get_id(&outsider).is_none());
    }

    #[test]
    fn test_cursor_scan_skips_free_slots() {
        let mut pool = DataArray::<u32>::with_capacity(5).unwrap();
        let handles: Vec<Id> = (0..5).map(|i| pool.alloc(i).unwrap()).collect();
        pool.free(handles[0]);
        pool.free(handles[3]);

        let mut seen = Vec::new();
        let mut cursor = None;
        while let Some((handle, value)) = pool.next(cursor) {
            seen.push(*value);
            cursor = Some(handle);
        }
        assert_eq!(seen, [1, 2, 4]);

        // Restarting from `None` yields the same sequence.
        assert_eq!(pool.next(None).map(|(_, v)| *v), Some(1));
        assert!(pool.next(Some(handles[4])).is_none());

        let collected: Vec<u32> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected, seen);
        assert_eq!(pool.handles().count(), 3);
    }

    #[test]
    fn test_iter_mut_updates_live_values() {
        let mut pool = DataArray::<u32>::with_capacity(3).unwrap();
        let a = pool.alloc(1).unwrap();
        let b = pool.alloc(2).unwrap();
        pool.free(a);
        for (_, value) in pool.iter_mut() {
            *value *= 10;
        }
        assert_eq!(pool[b], 20);
    }

    #[test]
    fn test_wide_pool() {
        let mut pool = DataArray::<&str, u64>::with_capacity(2).unwrap();
        let handle: Wid = pool.alloc("wide").unwrap();
        assert_eq!(handle.generation(), 1);
        assert_eq!(pool.try_to_get(handle), Some(&"wide"));
    }

    #[test]
    fn test_narrow_generation_wraps_without_zero() {
        let mut pool = DataArray::<u8>::with_capacity(1).unwrap();
        pool.next_key = <u32 as HandleRepr>::MAX_GENERATION;
        let last = pool.alloc(1).unwrap();
        assert_eq!(last.generation(), 0xffff);
        pool.free(last);
        let wrapped = pool.alloc(2).unwrap();
        assert_eq!(wrapped.generation(), 1);
        assert!(pool.try_to_get(last).is_none());
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn test_double_free_panics() {
        let mut pool = DataArray::<u32>::with_capacity(2).unwrap();
        let handle = pool.alloc(1).unwrap();
        pool.free(handle);
        pool.free(handle);
    }

    #[test]
    #[should_panic(expected = "stale handle")]
    fn test_free_of_stale_handle_panics() {
        let mut pool = DataArray::<u32>::with_capacity(1).unwrap();
        let old = pool.alloc(1).unwrap();
        pool.free(old);
        pool.alloc(2).unwrap();
        pool.free(old);
    }

    #[test]
    #[should_panic(expected = "invalid handle")]
    fn test_free_of_invalid_handle_panics() {
        let mut pool = DataArray::<u32>::with_capacity(1).unwrap();
        pool.free(Id::INVALID);
    }

    #[test]
    #[should_panic(expected = "free slot")]
    fn test_unchecked_get_of_free_slot_panics() {
        let mut pool = DataArray::<u32>::with_capacity(1).unwrap();
        let handle = pool.alloc(1).unwrap();
        pool.free(handle);
        let _ = pool.get(handle);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn invariants_hold_under_random_alloc_free(
                ops in proptest::collection::vec((any::<bool>(), 0usize..64), 1..200),
            ) {
                let mut pool = DataArray::<usize>::with_capacity(16).unwrap();
                let mut live: Vec<(Id, usize)> = Vec::new();
                let mut dead: Vec<Id> = Vec::new();

                for (step, (do_alloc, pick)) in ops.into_iter().enumerate() {
                    if do_alloc || live.is_empty() {
                        match pool.alloc(step) {
                            Ok(handle) => live.push((handle, step)),
                            Err(_) => prop_assert!(pool.full()),
                        }
                    } else {
                        let (handle, value) = live.swap_remove(pick % live.len());
                        prop_assert_eq!(pool.free(handle), value);
                        dead.push(handle);
                    }

                    check_invariants(&pool);
                    prop_assert_eq!(pool.len(), live.len());
                    for &(handle, value) in &live {
                        prop_assert_eq!(pool.try_to_get(handle), Some(&value));
                    }
                    for &handle in &dead {
                        prop_assert!(pool.try_to_get(handle).is_none());
                    }
                }
            }

            #[test]
            fn freed_slot_is_next_to_be_reused(
                count in 1usize..16,
                victim in 0usize..16,
            ) {
                let mut pool = DataArray::<usize>::with_capacity(16).unwrap();
                let handles: Vec<Id> = (0..count).map(|i| pool.alloc(i).unwrap()).collect();
                let victim = handles[victim % count];
                pool.free(victim);
                let reused = pool.alloc(99).unwrap();
                prop_assert_eq!(reused.index(), victim.index());
                prop_assert_ne!(reused, victim);
            }
        }
    }
}
