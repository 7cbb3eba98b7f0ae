//! Entity types stored in the model's pools.
//!
//! Entities reference each other only through [`Id`] handles and
//! [`IdList`]s; nothing here owns another entity.

use bitflags::bitflags;
use irr_data::{Id, IdList};

use crate::name::Name;

/// Short entity name.
pub type ShortName = Name<8>;

/// Type of the value a [`Condition`] points to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConditionType {
    /// `i32`, stored in `Model::integer32s`.
    #[default]
    Integer32,
    /// `i64`, stored in `Model::integer64s`.
    Integer64,
    /// `f64`, stored in `Model::real64s`.
    Real64,
    /// `String`, stored in `Model::strings`.
    String,
}

/// Named initial value for a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Condition {
    /// Handle into the value pool selected by `kind`.
    pub value: Id,
    pub kind: ConditionType,
    pub name: ShortName,
}

impl Condition {
    #[must_use]
    pub fn new(name: &str, kind: ConditionType) -> Self {
        Self {
            value: Id::INVALID,
            kind,
            name: Name::from(name),
        }
    }
}

/// Directed edge from an output slot of one node to an input slot of another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Connection {
    pub output_model: Id,
    pub output_slot: Id,
    pub input_model: Id,
    pub input_slot: Id,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    pub name: ShortName,
}

/// Behaviour plugged into an atomic node, located by package and library.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dynamic {
    pub name: ShortName,
    pub package: String,
    pub library: String,
}

bitflags! {
    /// What an observation view records.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ViewOptions: u8 {
        const ALLOC = 1 << 1;
        const OUTPUT = 1 << 2;
        const INTERNAL = 1 << 3;
        const EXTERNAL = 1 << 4;
        const CONFLUENT = 1 << 5;
        const FINISH = 1 << 6;
    }
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self::OUTPUT
    }
}

/// Where a view writes its observations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewType {
    #[default]
    CsvFile,
    JsonFile,
    Memory,
}

/// Observation point attached to one or more nodes.
#[derive(Debug, Default)]
pub struct View {
    /// Conditions parameterising the view.
    pub conditions: IdList,
    pub options: ViewOptions,
    pub kind: ViewType,
    pub name: Name<6>,
}

impl View {
    #[must_use]
    pub fn new(name: &str, kind: ViewType) -> Self {
        Self {
            name: Name::from(name),
            kind,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModelType {
    #[default]
    Atomic,
    Coupled,
}

/// A model in the hierarchy: atomic, or coupled with children.
#[derive(Debug, Default)]
pub struct Node {
    /// Enclosing coupled node, [`Id::INVALID`] for a root.
    pub parent: Id,
    pub name: ShortName,
    pub input_slots: u32,
    pub output_slots: u32,
    /// Handle into `Model::dynamics`.
    pub dynamics: Id,
    pub conditions: IdList,
    pub observables: IdList,
    pub children: IdList,
    pub connections: IdList,
    pub kind: ModelType,
}

impl Node {
    #[must_use]
    pub fn new(name: &str, kind: ModelType) -> Self {
        Self {
            name: Name::from(name),
            kind,
            ..Self::default()
        }
    }
}

/// A named, reusable model definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Class {
    /// Handle into `Model::strings`.
    pub name: Id,
    /// Handle into `Model::nodes`.
    pub model: Id,
}
