//! Model error types.

use irr_data::{Id, StorageError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A pool, relation list or index could not satisfy the request.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The handle no longer names a live entity of the given kind.
    #[error("stale {kind} handle {handle:?}")]
    StaleHandle { kind: &'static str, handle: Id },

    /// Children can only be attached to a node once, and never to itself or
    /// one of its descendants.
    #[error("cannot attach {child:?} under {parent:?}")]
    InvalidHierarchy { parent: Id, child: Id },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
