//! Storage error types.

use thiserror::Error;

/// Recoverable failures of the storage layer.
///
/// Contract violations (double free, out-of-range node positions, unchecked
/// access to a free slot) are not represented here: they panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Requested capacity is outside what the handle width can address.
    #[error("invalid capacity {requested} (max {max})")]
    InvalidCapacity {
        /// Capacity passed to `init`.
        requested: usize,
        /// Largest capacity accepted.
        max: usize,
    },

    /// Every slot is live and the free list is empty.
    #[error("capacity exhausted: all {capacity} slots are in use")]
    CapacityExhausted {
        /// Fixed capacity of the exhausted container.
        capacity: usize,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
