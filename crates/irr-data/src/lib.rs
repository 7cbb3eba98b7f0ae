#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::float_cmp)]

//! irr-data - Generational entity storage
//!
//! Fixed-capacity containers for simulation models whose entities reference
//! each other by handle rather than by pointer.
//!
//! # Key Concepts
//!
//! - **Handle**: A packed `(generation, index)` pair ([`Id`] is 32 bits, [`Wid`] 64 bits)
//! - **DataArray**: A slotted pool issuing handles; stale handles fail validation
//! - **IdList**: An ordered list of handles embedded in an entity, nodes in a shared [`DataList`]
//! - **Linker / MultiLinker**: Side tables keyed by handle index
//!
//! # Lazy Invalidation
//!
//! Freeing a value never touches the lists and tables that mention it. The
//! next validating walk notices the dead handle and drops it:
//!
//! ```
//! use irr_data::prelude::*;
//!
//! let mut nodes = DataArray::<&str>::with_capacity(8).unwrap();
//! let mut links = DataList::with_capacity(16).unwrap();
//! let mut children = IdList::new();
//!
//! let a = nodes.alloc("a").unwrap();
//! let b = nodes.alloc("b").unwrap();
//! children.push_back(&mut links, a).unwrap();
//! children.push_back(&mut links, b).unwrap();
//!
//! nodes.free(a);
//! let alive: Vec<&str> = children.iter(&mut links, &nodes).map(|(_, v)| *v).collect();
//! assert_eq!(alive, ["b"]);
//! assert_eq!(links.len(), 1);
//! ```

mod data_array;
mod data_list;
mod error;
mod handle;
mod linker;

pub use data_array::DataArray;
pub use data_list::{Cursor, DataList, Handles, IdList, Iter};
pub use error::{StorageError, StorageResult};
pub use handle::{Handle, HandleRepr, Id, Wid, next_generation};
pub use linker::{Linker, MultiLinker, Values, View};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{DataArray, DataList, Handle, Id, IdList, Linker, MultiLinker, Wid};
}
