//! The model: every entity pool plus the relation storage wiring them.
//!
//! Removing an entity frees it and whatever it owns (conditions, values,
//! connections, child nodes). Other entities that still mention it are not
//! touched: their relation lists drop the dead handle the next time they are
//! walked.

use irr_data::{DataArray, DataList, Id, IdList, MultiLinker};
use tracing::{debug, trace};

use crate::{
    config::ModelCapacities,
    entity::{
        Class, Condition, ConditionType, Connection, Dynamic, ModelType, Node, Slot, View,
        ViewType,
    },
    error::{ModelError, ModelResult},
    name::Name,
};

/// Semantic version of a model file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Value carried by a [`Condition`], stored in the pool matching its type.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionValue {
    Integer32(i32),
    Integer64(i64),
    Real64(f64),
    String(String),
}

impl ConditionValue {
    #[must_use]
    pub const fn kind(&self) -> ConditionType {
        match self {
            Self::Integer32(_) => ConditionType::Integer32,
            Self::Integer64(_) => ConditionType::Integer64,
            Self::Real64(_) => ConditionType::Real64,
            Self::String(_) => ConditionType::String,
        }
    }
}

#[derive(Debug)]
pub struct Model {
    pub name: Name<32>,
    pub author: Name<32>,
    pub version: Version,

    conditions: DataArray<Condition>,
    connections: DataArray<Connection>,
    slots: DataArray<Slot>,
    views: DataArray<View>,
    nodes: DataArray<Node>,
    classes: DataArray<Class>,
    dynamics: DataArray<Dynamic>,

    /// Nodes of every relation list held by entities of this model.
    links: DataList,
    /// View to the nodes it observes.
    observations: MultiLinker<u32, Id>,

    integer32s: DataArray<i32>,
    integer64s: DataArray<i64>,
    real64s: DataArray<f64>,
    strings: DataArray<String>,
}

fn stale(kind: &'static str, handle: Id) -> ModelError {
    ModelError::StaleHandle { kind, handle }
}

/// Live targets of `list`, pruning dead ones.
fn live<T>(list: &mut IdList, links: &mut DataList, pool: &DataArray<T>) -> Vec<Id> {
    list.iter(links, pool).map(|(id, _)| id).collect()
}

impl Model {
    /// Allocate every pool at the given capacities.
    pub fn new(capacities: &ModelCapacities) -> ModelResult<Self> {
        let model = Self {
            name: Name::new(),
            author: Name::new(),
            version: Version::default(),
            conditions: DataArray::with_capacity(capacities.conditions)?,
            connections: DataArray::with_capacity(capacities.connections)?,
            slots: DataArray::with_capacity(capacities.slots)?,
            views: DataArray::with_capacity(capacities.views)?,
            nodes: DataArray::with_capacity(capacities.nodes)?,
            classes: DataArray::with_capacity(capacities.classes)?,
            dynamics: DataArray::with_capacity(capacities.dynamics)?,
            links: DataList::with_capacity(capacities.links)?,
            observations: MultiLinker::with_capacity(capacities.views)?,
            integer32s: DataArray::with_capacity(capacities.integer32s)?,
            integer64s: DataArray::with_capacity(capacities.integer64s)?,
            real64s: DataArray::with_capacity(capacities.real64s)?,
            strings: DataArray::with_capacity(capacities.strings)?,
        };

        debug!(?capacities, "model allocated");
        Ok(model)
    }

    // ==================== Read access ====================

    #[must_use]
    pub fn node(&self, node: Id) -> Option<&Node> {
        self.nodes.try_to_get(node)
    }

    #[must_use]
    pub fn connection(&self, connection: Id) -> Option<&Connection> {
        self.connections.try_to_get(connection)
    }

    #[must_use]
    pub fn condition(&self, condition: Id) -> Option<&Condition> {
        self.conditions.try_to_get(condition)
    }

    #[must_use]
    pub fn view(&self, view: Id) -> Option<&View> {
        self.views.try_to_get(view)
    }

    #[must_use]
    pub fn slot(&self, slot: Id) -> Option<&Slot> {
        self.slots.try_to_get(slot)
    }

    #[must_use]
    pub fn dynamic(&self, dynamic: Id) -> Option<&Dynamic> {
        self.dynamics.try_to_get(dynamic)
    }

    #[must_use]
    pub fn class(&self, class: Id) -> Option<&Class> {
        self.classes.try_to_get(class)
    }

    #[must_use]
    pub fn nodes(&self) -> &DataArray<Node> {
        &self.nodes
    }

    #[must_use]
    pub fn connections(&self) -> &DataArray<Connection> {
        &self.connections
    }

    #[must_use]
    pub fn conditions(&self) -> &DataArray<Condition> {
        &self.conditions
    }

    #[must_use]
    pub fn views(&self) -> &DataArray<View> {
        &self.views
    }

    /// Shared relation node pool.
    #[must_use]
    pub fn links(&self) -> &DataList {
        &self.links
    }

    /// Whether `node` has no live parent. A node whose parent was removed
    /// is a root again.
    pub fn is_root(&self, node: Id) -> ModelResult<bool> {
        let parent = self.require_node(node)?.parent;
        Ok(!self.nodes.contains(parent))
    }

    /// Live nodes for which [`Model::is_root`] holds.
    pub fn roots(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes
            .handles()
            .filter(|&node| self.is_root(node).unwrap_or(false))
    }

    fn node_mut(&mut self, node: Id) -> ModelResult<&mut Node> {
        self.nodes.try_to_get_mut(node).ok_or_else(|| stale("node", node))
    }

    fn require_node(&self, node: Id) -> ModelResult<&Node> {
        self.nodes.try_to_get(node).ok_or_else(|| stale("node", node))
    }

    fn require_view(&self, view: Id) -> ModelResult<&View> {
        self.views.try_to_get(view).ok_or_else(|| stale("view", view))
    }

    // ==================== Nodes ====================

    /// Allocate a detached node.
    pub fn add_node(&mut self, name: &str, kind: ModelType) -> ModelResult<Id> {
        let node = self.nodes.alloc(Node::new(name, kind))?;
        debug!(%node, name, ?kind, "node added");
        Ok(node)
    }

    /// Attach `child` under `parent`, making `parent` coupled.
    ///
    /// The child must not already have a live parent and must not be
    /// `parent` or one of its ancestors.
    pub fn add_child(&mut self, parent: Id, child: Id) -> ModelResult<()> {
        self.require_node(parent)?;
        if !self.is_root(child)? {
            return Err(ModelError::InvalidHierarchy { parent, child });
        }

        let mut ancestor = parent;
        while let Some(node) = self.nodes.try_to_get(ancestor) {
            if ancestor == child {
                return Err(ModelError::InvalidHierarchy { parent, child });
            }
            ancestor = node.parent;
        }

        let Self { nodes, links, .. } = self;
        let entry = &mut nodes[parent];
        entry.children.push_back(links, child)?;
        entry.kind = ModelType::Coupled;
        nodes[child].parent = parent;

        debug!(%parent, %child, "child attached");
        Ok(())
    }

    /// Live children of `node`, in attachment order.
    pub fn children(&mut self, node: Id) -> ModelResult<Vec<Id>> {
        let mut list = std::mem::take(&mut self.node_mut(node)?.children);
        let children = live(&mut list, &mut self.links, &self.nodes);
        self.nodes[node].children = list;
        Ok(children)
    }

    /// Free `node` and its whole subtree. Returns the number of nodes freed.
    ///
    /// Connections, conditions and condition values owned by the removed
    /// nodes are freed with them. Parents, peers and views that still
    /// reference a removed node prune it lazily.
    pub fn remove_node(&mut self, node: Id) -> ModelResult<usize> {
        self.require_node(node)?;

        let mut pending = vec![node];
        let mut removed = 0;

        while let Some(id) = pending.pop() {
            if !self.nodes.contains(id) {
                continue;
            }
            let mut entry = self.nodes.free(id);

            pending.extend(
                entry
                    .children
                    .iter(&mut self.links, &self.nodes)
                    .filter(|(_, child)| child.parent == id)
                    .map(|(child, _)| child),
            );
            entry.children.clear(&mut self.links);

            for connection in live(&mut entry.connections, &mut self.links, &self.connections) {
                self.connections.free(connection);
            }
            entry.connections.clear(&mut self.links);

            for condition in live(&mut entry.conditions, &mut self.links, &self.conditions) {
                self.free_condition(condition);
            }
            entry.conditions.clear(&mut self.links);
            entry.observables.clear(&mut self.links);

            trace!(node = %id, "node freed");
            removed += 1;
        }

        debug!(%node, removed, "node removed");
        Ok(removed)
    }

    // ==================== Slots and connections ====================

    /// Allocate an input slot on `node`.
    pub fn add_input_slot(&mut self, node: Id, name: &str) -> ModelResult<Id> {
        self.require_node(node)?;
        let slot = self.slots.alloc(Slot {
            name: Name::from(name),
        })?;
        self.nodes[node].input_slots += 1;
        Ok(slot)
    }

    /// Allocate an output slot on `node`.
    pub fn add_output_slot(&mut self, node: Id, name: &str) -> ModelResult<Id> {
        self.require_node(node)?;
        let slot = self.slots.alloc(Slot {
            name: Name::from(name),
        })?;
        self.nodes[node].output_slots += 1;
        Ok(slot)
    }

    /// Connect an output slot of `output_model` to an input slot of
    /// `input_model`. The connection is recorded on both endpoints.
    pub fn connect(
        &mut self,
        output_model: Id,
        output_slot: Id,
        input_model: Id,
        input_slot: Id,
    ) -> ModelResult<Id> {
        self.require_node(output_model)?;
        self.require_node(input_model)?;
        for slot in [output_slot, input_slot] {
            if !self.slots.contains(slot) {
                return Err(stale("slot", slot));
            }
        }

        let connection = self.connections.alloc(Connection {
            output_model,
            output_slot,
            input_model,
            input_slot,
        })?;

        let Self {
            nodes,
            links,
            connections,
            ..
        } = self;

        if let Err(err) = nodes[output_model].connections.push_back(links, connection) {
            connections.free(connection);
            return Err(err.into());
        }
        if input_model != output_model {
            if let Err(err) = nodes[input_model].connections.push_back(links, connection) {
                nodes[output_model].connections.pop_back(links);
                connections.free(connection);
                return Err(err.into());
            }
        }

        debug!(%connection, %output_model, %input_model, "models connected");
        Ok(connection)
    }

    /// Live connections touching `node`.
    pub fn node_connections(&mut self, node: Id) -> ModelResult<Vec<Id>> {
        let Self {
            nodes,
            links,
            connections,
            ..
        } = self;
        let entry = nodes.try_to_get_mut(node).ok_or_else(|| stale("node", node))?;
        Ok(live(&mut entry.connections, links, connections))
    }

    /// Free a connection. Both endpoints prune it lazily.
    pub fn disconnect(&mut self, connection: Id) -> ModelResult<Connection> {
        if !self.connections.contains(connection) {
            return Err(stale("connection", connection));
        }
        Ok(self.connections.free(connection))
    }

    // ==================== Conditions ====================

    fn alloc_condition(&mut self, name: &str, value: ConditionValue) -> ModelResult<Id> {
        let kind = value.kind();
        let value = match value {
            ConditionValue::Integer32(v) => self.integer32s.alloc(v)?,
            ConditionValue::Integer64(v) => self.integer64s.alloc(v)?,
            ConditionValue::Real64(v) => self.real64s.alloc(v)?,
            ConditionValue::String(v) => self.strings.alloc(v)?,
        };

        let mut condition = Condition::new(name, kind);
        condition.value = value;
        match self.conditions.alloc(condition) {
            Ok(id) => Ok(id),
            Err(err) => {
                self.free_value(kind, value);
                Err(err.into())
            }
        }
    }

    fn free_value(&mut self, kind: ConditionType, value: Id) {
        match kind {
            ConditionType::Integer32 => {
                self.integer32s.free(value);
            }
            ConditionType::Integer64 => {
                self.integer64s.free(value);
            }
            ConditionType::Real64 => {
                self.real64s.free(value);
            }
            ConditionType::String => {
                self.strings.free(value);
            }
        }
    }

    fn free_condition(&mut self, condition: Id) {
        let condition = self.conditions.free(condition);
        self.free_value(condition.kind, condition.value);
    }

    /// Add a named initial value to `node`.
    pub fn add_condition(&mut self, node: Id, name: &str, value: ConditionValue) -> ModelResult<Id> {
        self.require_node(node)?;
        let condition = self.alloc_condition(name, value)?;

        let Self { nodes, links, .. } = self;
        if let Err(err) = nodes[node].conditions.push_back(links, condition) {
            self.free_condition(condition);
            return Err(err.into());
        }

        debug!(%node, %condition, name, "condition added");
        Ok(condition)
    }

    /// Live conditions of `node`.
    pub fn node_conditions(&mut self, node: Id) -> ModelResult<Vec<Id>> {
        let Self {
            nodes,
            links,
            conditions,
            ..
        } = self;
        let entry = nodes.try_to_get_mut(node).ok_or_else(|| stale("node", node))?;
        Ok(live(&mut entry.conditions, links, conditions))
    }

    /// Copy of the value a condition points to.
    pub fn condition_value(&self, condition: Id) -> ModelResult<ConditionValue> {
        let entry = self
            .conditions
            .try_to_get(condition)
            .ok_or_else(|| stale("condition", condition))?;
        let value = entry.value;
        let missing = || stale("condition value", value);

        Ok(match entry.kind {
            ConditionType::Integer32 => {
                ConditionValue::Integer32(*self.integer32s.try_to_get(value).ok_or_else(missing)?)
            }
            ConditionType::Integer64 => {
                ConditionValue::Integer64(*self.integer64s.try_to_get(value).ok_or_else(missing)?)
            }
            ConditionType::Real64 => {
                ConditionValue::Real64(*self.real64s.try_to_get(value).ok_or_else(missing)?)
            }
            ConditionType::String => {
                ConditionValue::String(self.strings.try_to_get(value).ok_or_else(missing)?.clone())
            }
        })
    }

    /// First condition named `name`, in slot order.
    #[must_use]
    pub fn find_condition(&self, name: &str) -> Option<Id> {
        let mut cursor = None;
        while let Some((id, condition)) = self.conditions.next(cursor) {
            if condition.name == name {
                return Some(id);
            }
            cursor = Some(id);
        }
        None
    }

    // ==================== Views ====================

    pub fn add_view(&mut self, name: &str, kind: ViewType) -> ModelResult<Id> {
        let view = self.views.alloc(View::new(name, kind))?;
        debug!(%view, name, ?kind, "view added");
        Ok(view)
    }

    /// Add a named parameter to `view`.
    pub fn add_view_condition(
        &mut self,
        view: Id,
        name: &str,
        value: ConditionValue,
    ) -> ModelResult<Id> {
        self.require_view(view)?;
        let condition = self.alloc_condition(name, value)?;

        let Self { views, links, .. } = self;
        if let Err(err) = views[view].conditions.push_back(links, condition) {
            self.free_condition(condition);
            return Err(err.into());
        }
        Ok(condition)
    }

    /// Live conditions of `view`.
    pub fn view_conditions(&mut self, view: Id) -> ModelResult<Vec<Id>> {
        let Self {
            views,
            links,
            conditions,
            ..
        } = self;
        let entry = views.try_to_get_mut(view).ok_or_else(|| stale("view", view))?;
        Ok(live(&mut entry.conditions, links, conditions))
    }

    /// Let `view` observe `node`. Observing twice is a no-op.
    pub fn observe(&mut self, node: Id, view: Id) -> ModelResult<()> {
        self.require_view(view)?;
        let Self {
            nodes,
            links,
            observations,
            ..
        } = self;
        let entry = nodes.try_to_get_mut(node).ok_or_else(|| stale("node", node))?;

        if entry.observables.contains(links, view) {
            return Ok(());
        }
        entry.observables.push_back(links, view)?;
        observations.emplace(view, node);

        debug!(%node, %view, "observation added");
        Ok(())
    }

    /// Live views observing `node`.
    pub fn observers(&mut self, node: Id) -> ModelResult<Vec<Id>> {
        let Self {
            nodes,
            links,
            views,
            ..
        } = self;
        let entry = nodes.try_to_get_mut(node).ok_or_else(|| stale("node", node))?;
        Ok(live(&mut entry.observables, links, views))
    }

    /// Live nodes observed by `view`, most recent first.
    pub fn observed_nodes(&mut self, view: Id) -> ModelResult<Vec<Id>> {
        self.require_view(view)?;
        Ok(self
            .observations
            .get_view(view, &self.nodes)
            .map(|(node, _)| node)
            .collect())
    }

    /// Free `view`, its conditions and its observation entries.
    pub fn remove_view(&mut self, view: Id) -> ModelResult<()> {
        self.require_view(view)?;
        let mut entry = self.views.free(view);

        for condition in live(&mut entry.conditions, &mut self.links, &self.conditions) {
            self.free_condition(condition);
        }
        entry.conditions.clear(&mut self.links);
        let observed = self.observations.destroy(view);

        debug!(%view, observed, "view removed");
        Ok(())
    }

    // ==================== Dynamics and classes ====================

    pub fn add_dynamic(&mut self, name: &str, package: &str, library: &str) -> ModelResult<Id> {
        let dynamic = self.dynamics.alloc(Dynamic {
            name: Name::from(name),
            package: package.to_owned(),
            library: library.to_owned(),
        })?;
        Ok(dynamic)
    }

    /// Plug `dynamic` into an atomic `node`.
    pub fn set_dynamics(&mut self, node: Id, dynamic: Id) -> ModelResult<()> {
        if !self.dynamics.contains(dynamic) {
            return Err(stale("dynamic", dynamic));
        }
        self.node_mut(node)?.dynamics = dynamic;
        Ok(())
    }

    /// Register `model` as a reusable class called `name`.
    pub fn add_class(&mut self, name: &str, model: Id) -> ModelResult<Id> {
        self.require_node(model)?;
        let name = self.strings.alloc(name.to_owned())?;
        match self.classes.alloc(Class { name, model }) {
            Ok(class) => Ok(class),
            Err(err) => {
                self.strings.free(name);
                Err(err.into())
            }
        }
    }

    /// Name of a class, `None` if the class is gone.
    #[must_use]
    pub fn class_name(&self, class: Id) -> Option<&str> {
        let class = self.classes.try_to_get(class)?;
        self.strings.try_to_get(class.name).map(String::as_str)
    }

    /// Free a class and its name. The model it points to is left alone.
    pub fn remove_class(&mut self, class: Id) -> ModelResult<()> {
        if !self.classes.contains(class) {
            return Err(stale("class", class));
        }
        let class = self.classes.free(class);
        self.strings.free(class.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use irr_data::StorageError;

    use super::*;

    fn model() -> Model {
        Model::new(&ModelCapacities::from_estimate(8)).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_sized_pools() {
        let err = Model::new(&ModelCapacities::from_estimate(0)).unwrap_err();
        assert!(matches!(err, ModelError::Storage(_)));
    }

    #[test]
    fn test_add_child_marks_parent_coupled() {
        let mut model = model();
        let root = model.add_node("root", ModelType::Atomic).unwrap();
        let leaf = model.add_node("leaf", ModelType::Atomic).unwrap();

        model.add_child(root, leaf).unwrap();
        assert_eq!(model.node(root).unwrap().kind, ModelType::Coupled);
        assert_eq!(model.node(leaf).unwrap().parent, root);
        assert_eq!(model.children(root).unwrap(), [leaf]);
        assert_eq!(model.roots().collect::<Vec<_>>(), [root]);
    }

    #[test]
    fn test_add_child_rejects_cycles_and_reparenting() {
        let mut model = model();
        let a = model.add_node("a", ModelType::Coupled).unwrap();
        let b = model.add_node("b", ModelType::Coupled).unwrap();
        let c = model.add_node("c", ModelType::Coupled).unwrap();
        model.add_child(a, b).unwrap();

        assert_eq!(
            model.add_child(b, a),
            Err(ModelError::InvalidHierarchy {
                parent: b,
                child: a
            })
        );
        assert!(model.add_child(a, a).is_err());
        assert!(model.add_child(c, b).is_err());
    }

    #[test]
    fn test_condition_values_roundtrip_through_pools() {
        let mut model = model();
        let node = model.add_node("gen", ModelType::Atomic).unwrap();
        let period = model
            .add_condition(node, "period", ConditionValue::Real64(0.5))
            .unwrap();
        let label = model
            .add_condition(node, "label", ConditionValue::String("tick".into()))
            .unwrap();

        assert_eq!(model.condition_value(period).unwrap(), ConditionValue::Real64(0.5));
        assert_eq!(
            model.condition_value(label).unwrap(),
            ConditionValue::String("tick".into())
        );
        assert_eq!(model.condition(label).unwrap().kind, ConditionType::String);
        assert_eq!(model.node_conditions(node).unwrap(), [period, label]);
        assert_eq!(model.find_condition("label"), Some(label));
        assert_eq!(model.find_condition("missing"), None);
    }

    #[test]
    fn test_condition_pool_exhaustion_frees_value() {
        let mut caps = ModelCapacities::from_estimate(4);
        caps.conditions = 1;
        let mut model = Model::new(&caps).unwrap();
        let node = model.add_node("n", ModelType::Atomic).unwrap();
        model
            .add_condition(node, "a", ConditionValue::Integer32(1))
            .unwrap();

        let err = model
            .add_condition(node, "b", ConditionValue::Integer32(2))
            .unwrap_err();
        assert!(matches!(err, ModelError::Storage(_)));
        assert_eq!(model.integer32s.len(), 1);
    }

    /// Model whose relation node pool holds a single entry.
    fn model_with_one_link() -> Model {
        let mut caps = ModelCapacities::from_estimate(4);
        caps.links = 1;
        Model::new(&caps).unwrap()
    }

    #[test]
    fn test_connect_rolls_back_when_second_endpoint_is_full() {
        let mut model = model_with_one_link();
        let a = model.add_node("a", ModelType::Atomic).unwrap();
        let b = model.add_node("b", ModelType::Atomic).unwrap();
        let out = model.add_output_slot(a, "out").unwrap();
        let input = model.add_input_slot(b, "in").unwrap();

        let err = model.connect(a, out, b, input).unwrap_err();
        assert_eq!(
            err,
            ModelError::Storage(StorageError::CapacityExhausted { capacity: 1 })
        );
        assert!(model.connections.is_empty());
        assert!(model.links.is_empty());
        assert!(model.node_connections(a).unwrap().is_empty());
        assert!(model.node_connections(b).unwrap().is_empty());
    }

    #[test]
    fn test_connect_rolls_back_when_first_endpoint_is_full() {
        let mut model = model_with_one_link();
        let top = model.add_node("top", ModelType::Coupled).unwrap();
        let a = model.add_node("a", ModelType::Atomic).unwrap();
        let b = model.add_node("b", ModelType::Atomic).unwrap();
        model.add_child(top, a).unwrap();
        let out = model.add_output_slot(a, "out").unwrap();
        let input = model.add_input_slot(b, "in").unwrap();

        assert!(model.connect(a, out, b, input).is_err());
        assert!(model.connections.is_empty());
        assert_eq!(model.links.len(), 1);
        assert_eq!(model.children(top).unwrap(), [a]);
    }

    #[test]
    fn test_add_condition_rolls_back_when_links_are_full() {
        let mut model = model_with_one_link();
        let node = model.add_node("n", ModelType::Atomic).unwrap();
        let kept = model
            .add_condition(node, "a", ConditionValue::String("kept".into()))
            .unwrap();

        let err = model
            .add_condition(node, "b", ConditionValue::String("dropped".into()))
            .unwrap_err();
        assert!(matches!(err, ModelError::Storage(_)));
        assert_eq!(model.conditions.len(), 1);
        assert_eq!(model.strings.len(), 1);
        assert_eq!(model.links.len(), 1);
        assert_eq!(model.node_conditions(node).unwrap(), [kept]);
        assert_eq!(model.find_condition("b"), None);
    }

    #[test]
    fn test_add_view_condition_rolls_back_when_links_are_full() {
        let mut model = model_with_one_link();
        let view = model.add_view("csv", ViewType::CsvFile).unwrap();
        let step = model
            .add_view_condition(view, "step", ConditionValue::Real64(0.1))
            .unwrap();

        let err = model
            .add_view_condition(view, "until", ConditionValue::Integer64(10))
            .unwrap_err();
        assert!(matches!(err, ModelError::Storage(_)));
        assert_eq!(model.conditions.len(), 1);
        assert_eq!(model.real64s.len(), 1);
        assert!(model.integer64s.is_empty());
        assert_eq!(model.links.len(), 1);
        assert_eq!(model.view_conditions(view).unwrap(), [step]);
    }

    #[test]
    fn test_orphan_becomes_root_again() {
        let mut model = model();
        let top = model.add_node("top", ModelType::Coupled).unwrap();
        let leaf = model.add_node("leaf", ModelType::Atomic).unwrap();
        let other = model.add_node("other", ModelType::Coupled).unwrap();
        model.add_child(top, leaf).unwrap();
        assert_eq!(model.is_root(leaf), Ok(false));

        // Free only `top`; `leaf` keeps its stale parent handle.
        model.nodes.free(top);
        assert_eq!(model.node(leaf).unwrap().parent, top);
        assert_eq!(model.is_root(leaf), Ok(true));
        assert_eq!(model.roots().collect::<Vec<_>>(), [leaf, other]);

        model.add_child(other, leaf).unwrap();
        assert_eq!(model.roots().collect::<Vec<_>>(), [other]);
        assert!(model.is_root(top).is_err());
    }

    #[test]
    fn test_remove_node_frees_owned_entities() {
        let mut model = model();
        let node = model.add_node("n", ModelType::Atomic).unwrap();
        model
            .add_condition(node, "seed", ConditionValue::Integer64(42))
            .unwrap();

        assert_eq!(model.remove_node(node).unwrap(), 1);
        assert!(model.conditions.is_empty());
        assert!(model.integer64s.is_empty());
        assert!(model.links.is_empty());
        assert_eq!(
            model.remove_node(node),
            Err(ModelError::StaleHandle {
                kind: "node",
                handle: node
            })
        );
    }

    #[test]
    fn test_class_owns_its_name() {
        let mut model = model();
        let node = model.add_node("proto", ModelType::Atomic).unwrap();
        let class = model.add_class("Counter", node).unwrap();

        assert_eq!(model.class_name(class), Some("Counter"));
        assert_eq!(model.class(class).unwrap().model, node);
        model.remove_class(class).unwrap();
        assert!(model.strings.is_empty());
        assert_eq!(model.class_name(class), None);
    }

    #[test]
    fn test_set_dynamics_checks_both_ends() {
        let mut model = model();
        let node = model.add_node("n", ModelType::Atomic).unwrap();
        let dynamic = model.add_dynamic("counter", "vle", "libcounter").unwrap();

        model.set_dynamics(node, dynamic).unwrap();
        assert_eq!(model.node(node).unwrap().dynamics, dynamic);
        assert_eq!(model.dynamic(dynamic).unwrap().library, "libcounter");
        assert!(model.set_dynamics(node, Id::new(9, 0)).is_err());
    }
}
