#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

//! irr-model - Modeling entity catalogue
//!
//! A [`Model`] holds one fixed-capacity pool per entity kind (nodes,
//! connections, slots, conditions, views, dynamics, classes and the raw
//! condition values) and a single relation node pool shared by every
//! [`IdList`](irr_data::IdList) embedded in those entities.
//!
//! ```
//! use irr_model::prelude::*;
//!
//! let mut model = Model::new(&ModelCapacities::from_estimate(16)).unwrap();
//! let top = model.add_node("top", ModelType::Coupled).unwrap();
//! let generator = model.add_node("generator", ModelType::Atomic).unwrap();
//! model.add_child(top, generator).unwrap();
//!
//! model.remove_node(generator).unwrap();
//! assert!(model.children(top).unwrap().is_empty());
//! ```

mod config;
mod entity;
mod error;
mod model;
mod name;

pub use config::ModelCapacities;
pub use entity::{
    Class, Condition, ConditionType, Connection, Dynamic, ModelType, Node, ShortName, Slot, View,
    ViewOptions, ViewType,
};
pub use error::{ModelError, ModelResult};
pub use model::{ConditionValue, Model, Version};
pub use name::Name;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ConditionValue, Model, ModelCapacities, ModelError, ModelType, ViewOptions, ViewType,
    };
    pub use irr_data::Id;
}
