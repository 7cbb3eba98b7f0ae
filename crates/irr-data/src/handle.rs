//! Generational handles.
//!
//! A handle packs a slot index and a generation key into one integer, so it
//! can be stored in entity fields, copied freely and compared cheaply. The
//! generation lets a pool detect a handle that outlived the value it named:
//! the slot may have been reused, but never with the same generation.
//!
//! Two widths exist, sharing one implementation:
//!
//! | alias   | raw   | index bits | generation bits | max capacity |
//! |---------|-------|------------|-----------------|--------------|
//! | [`Id`]  | `u32` | 16         | 16              | 65 535       |
//! | [`Wid`] | `u64` | 32         | 32              | `i32::MAX`   |
//!
//! Generation `0` is reserved: a handle carrying it is the invalid handle and
//! never names a live slot.

use std::{fmt, hash::Hash};

mod sealed {
    pub trait Sealed {}

    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Raw integer a [`Handle`] is packed into.
///
/// Implemented for `u32` (narrow handles) and `u64` (wide handles). The index
/// lives in the low half of the word and the generation in the high half.
pub trait HandleRepr:
    sealed::Sealed + Copy + Eq + Ord + Hash + Default + fmt::Debug + Send + Sync + 'static
{
    /// Width of each sub-field in bits.
    const HALF_BITS: u32;

    /// All-zero raw value (the invalid handle).
    const ZERO: Self;

    /// Largest capacity a pool keyed by this width accepts.
    const MAX_CAPACITY: usize;

    /// Largest generation representable before wrapping back to 1.
    const MAX_GENERATION: u32 = ((1u64 << Self::HALF_BITS) - 1) as u32;

    /// Short name used by `Debug` output.
    const NAME: &'static str;

    /// Widen to `u64`.
    fn to_u64(self) -> u64;

    /// Narrow from `u64`, discarding high bits.
    fn from_u64(bits: u64) -> Self;
}

impl HandleRepr for u32 {
    const HALF_BITS: u32 = 16;
    const ZERO: Self = 0;
    const MAX_CAPACITY: usize = u16::MAX as usize;
    const NAME: &'static str = "Id";

    #[inline]
    fn to_u64(self) -> u64 {
        u64::from(self)
    }

    #[inline]
    fn from_u64(bits: u64) -> Self {
        bits as Self
    }
}

impl HandleRepr for u64 {
    const HALF_BITS: u32 = 32;
    const ZERO: Self = 0;
    const MAX_CAPACITY: usize = i32::MAX as usize;
    const NAME: &'static str = "Wid";

    #[inline]
    fn to_u64(self) -> u64 {
        self
    }

    #[inline]
    fn from_u64(bits: u64) -> Self {
        bits
    }
}

/// A generation-checked reference to a pool slot.
///
/// Handles are plain values. Copying or storing one never keeps the target
/// alive; a stale copy simply fails validation in
/// [`DataArray::try_to_get`](crate::DataArray::try_to_get).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Handle<R: HandleRepr = u32>(R);

/// Narrow 32-bit handle (16-bit index, 16-bit generation).
pub type Id = Handle<u32>;

/// Wide 64-bit handle (32-bit index, 32-bit generation).
pub type Wid = Handle<u64>;

impl<R: HandleRepr> Handle<R> {
    /// The reserved invalid handle (generation 0, index 0).
    pub const INVALID: Self = Self(R::ZERO);

    /// Pack a generation and an index.
    ///
    /// Both values must fit in [`HandleRepr::HALF_BITS`] bits. Debug builds
    /// assert it; release builds pack unchecked, so an out-of-range value yields
    /// a different handle. Use [`Handle::try_new`] for values that are not
    /// known to fit.
    #[inline]
    #[must_use]
    pub fn new(generation: u32, index: u32) -> Self {
        debug_assert!(
            u64::from(generation) <= u64::from(R::MAX_GENERATION),
            "generation {generation} does not fit in a {}",
            R::NAME
        );
        debug_assert!(
            u64::from(index) < (1u64 << R::HALF_BITS),
            "index {index} does not fit in a {}",
            R::NAME
        );

        let bits = (u64::from(generation) << R::HALF_BITS) | u64::from(index);
        Self(R::from_u64(bits))
    }

    /// Pack a generation and an index, or `None` if either does not fit.
    #[must_use]
    pub fn try_new(generation: u32, index: u32) -> Option<Self> {
        let fits = u64::from(generation) <= u64::from(R::MAX_GENERATION)
            && u64::from(index) < (1u64 << R::HALF_BITS);
        fits.then(|| Self::new(generation, index))
    }

    /// Slot index within the pool that issued the handle.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        let mask = (1u64 << R::HALF_BITS) - 1;
        (self.0.to_u64() & mask) as usize
    }

    /// Generation key, already shifted down to `1..=MAX_GENERATION`.
    #[inline]
    #[must_use]
    pub fn generation(self) -> u32 {
        (self.0.to_u64() >> R::HALF_BITS) as u32
    }

    /// Whether the handle can name a live slot at all (`generation != 0`).
    ///
    /// This does not consult any pool.
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.generation() != 0
    }

    /// Raw packed integer.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> R {
        self.0
    }

    /// Rebuild a handle from its raw packed integer.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: R) -> Self {
        Self(bits)
    }
}

/// Generation that follows `generation`, wrapping from
/// [`HandleRepr::MAX_GENERATION`] back to 1 so that 0 is never produced.
#[inline]
#[must_use]
pub fn next_generation<R: HandleRepr>(generation: u32) -> u32 {
    if generation >= R::MAX_GENERATION {
        1
    } else {
        generation + 1
    }
}

impl<R: HandleRepr> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}({}v{})", R::NAME, self.index(), self.generation())
        } else {
            write!(f, "{}(invalid)", R::NAME)
        }
    }
}

impl<R: HandleRepr> fmt::Display for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}
