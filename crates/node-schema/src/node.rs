//! Node instances
//!
//! A [`NodeInstance`] owns its input and output sockets, the live values of its
//! storage-backed parameters and its reference slots. Sockets change only
//! through reconciliation, which the owning [`NodeTree`](crate::NodeTree)
//! drives so that links on removed sockets are severed at both ends.

use std::fmt;
use std::sync::Arc;

use catalog_refs::{Catalog, CatalogEntry, ReferenceStore, WriteOutcome};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::node_type::NodeType;
use crate::parameter::{Direction, ParameterSpec};
use crate::reconcile::{reconcile_direction, ReconcileReport};
use crate::render::{self, Layout};
use crate::socket::{Socket, SocketId, SocketList};
use crate::value::{ParamValue, ValueStore};

/// Unique identifier for a node within its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// A node in a tree, bound to a shared node type
#[derive(Debug)]
pub struct NodeInstance {
    id: NodeId,
    node_type: Arc<NodeType>,
    inputs: SocketList,
    outputs: SocketList,
    values: ValueStore,
    references: ReferenceStore,
    next_socket: u64,
}

impl NodeInstance {
    /// Create an uninitialized node. Sockets appear on [`init`](Self::init).
    pub fn new(id: NodeId, node_type: Arc<NodeType>) -> Result<Self> {
        let mut references = ReferenceStore::new();
        for (attr, slot) in node_type.references() {
            references.register(attr.clone(), slot.clone())?;
        }
        Ok(Self {
            id,
            node_type,
            inputs: SocketList::new(),
            outputs: SocketList::new(),
            values: ValueStore::new(),
            references,
            next_socket: 0,
        })
    }

    /// Run the node type's init hook, then reconcile
    pub(crate) fn init(&mut self) -> ReconcileReport {
        let node_type = self.node_type.clone();
        node_type.run_init_hook(self);
        self.reconcile()
    }

    /// Bring sockets and live values in line with the node type's schema
    pub(crate) fn reconcile(&mut self) -> ReconcileReport {
        let schema = self.node_type.schema().clone();
        let mut report = ReconcileReport {
            inputs: reconcile_direction(
                &schema,
                Direction::Input,
                &mut self.inputs,
                &mut self.next_socket,
            ),
            outputs: reconcile_direction(
                &schema,
                Direction::Output,
                &mut self.outputs,
                &mut self.next_socket,
            ),
            ..Default::default()
        };

        for spec in schema.stored_parameters() {
            let Some(storage) = spec.storage() else {
                continue;
            };
            let current_ok = self
                .values
                .get(spec.identifier())
                .is_some_and(|v| v.same_shape(&storage.default));
            if !current_ok {
                self.values.set(spec.identifier(), storage.default.clone());
                report.values_added.push(spec.identifier().to_string());
            }
        }
        let stale: Vec<String> = self
            .values
            .identifiers()
            .filter(|id| schema.get(id).and_then(|p| p.storage()).is_none())
            .map(str::to_string)
            .collect();
        for id in stale {
            self.values.remove(&id);
            report.values_dropped.push(id);
        }

        if !report.is_noop() {
            log::debug!(
                "Reconciled {} ({}): inputs +{} ~{} >{} -{}, outputs +{} ~{} >{} -{}",
                self.id,
                self.node_type.id(),
                report.inputs.created.len(),
                report.inputs.refreshed.len(),
                report.inputs.moved.len(),
                report.inputs.removed.len(),
                report.outputs.created.len(),
                report.outputs.refreshed.len(),
                report.outputs.moved.len(),
                report.outputs.removed.len(),
            );
        }
        report
    }

    /// Switch to another node type, keeping sockets until the next reconcile.
    ///
    /// Reference slots follow the new type: slots it no longer declares are
    /// removed, new ones are added empty, and kept ones keep their name.
    pub(crate) fn rebind(&mut self, node_type: Arc<NodeType>) -> Result<()> {
        let declared: Vec<&str> = node_type.references().iter().map(|(a, _)| a.as_str()).collect();
        let stale: Vec<String> = self
            .references
            .attrs()
            .filter(|attr| !declared.contains(attr))
            .map(str::to_string)
            .collect();
        for attr in stale {
            self.references.unregister(&attr)?;
        }
        for (attr, slot) in node_type.references() {
            if !self.references.contains(attr) {
                self.references.register(attr.clone(), slot.clone())?;
            }
        }
        self.node_type = node_type;
        Ok(())
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.node_type
    }

    pub fn inputs(&self) -> &SocketList {
        &self.inputs
    }

    pub fn outputs(&self) -> &SocketList {
        &self.outputs
    }

    pub fn sockets(&self, direction: Direction) -> &SocketList {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub(crate) fn sockets_mut(&mut self, direction: Direction) -> &mut SocketList {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    pub fn find_socket(&self, direction: Direction, identifier: &str) -> Result<&Socket> {
        self.sockets(direction)
            .find(identifier)
            .ok_or_else(|| SchemaError::SocketNotFound(format!("{}.{}", self.id, identifier)))
    }

    /// Look up a socket by uid in either direction
    pub fn socket(&self, uid: SocketId) -> Option<&Socket> {
        self.inputs.by_uid(uid).or_else(|| self.outputs.by_uid(uid))
    }

    pub(crate) fn socket_mut(&mut self, uid: SocketId) -> Option<&mut Socket> {
        match self.inputs.by_uid_mut(uid) {
            Some(socket) => Some(socket),
            None => self.outputs.by_uid_mut(uid),
        }
    }

    /// Parameters of one direction in schema order
    pub fn parameters(&self, direction: Direction) -> Vec<&ParameterSpec> {
        self.node_type.schema().parameters(direction).collect()
    }

    pub fn find_parameter(&self, direction: Direction, identifier: &str) -> Result<&ParameterSpec> {
        self.node_type.find_parameter(direction, identifier)
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ValueStore {
        &mut self.values
    }

    /// Live value of the parameter behind `socket`
    pub fn socket_value(&self, socket: &Socket) -> Option<&ParamValue> {
        self.values.get(socket.identifier())
    }

    pub fn references(&self) -> &ReferenceStore {
        &self.references
    }

    /// Resolve a reference slot, clearing it if its entry is gone
    pub fn reference(&mut self, attr: &str, catalog: &dyn Catalog) -> Result<Option<CatalogEntry>> {
        Ok(self.references.read(attr, catalog)?)
    }

    pub fn set_reference(
        &mut self,
        attr: &str,
        entry: Option<&CatalogEntry>,
        catalog: &mut dyn Catalog,
    ) -> Result<WriteOutcome> {
        Ok(self.references.write(attr, entry, catalog)?)
    }

    pub fn set_reference_name(
        &mut self,
        attr: &str,
        name: &str,
        catalog: &mut dyn Catalog,
    ) -> Result<WriteOutcome> {
        Ok(self.references.set_name(attr, name, catalog)?)
    }

    pub fn draw_reference(&self, layout: &mut dyn Layout, attr: &str, text: &str) -> Result<()> {
        render::draw_reference(layout, &self.references, attr, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_type::NodeTypeBuilder;
    use crate::parameter::ParameterDecl;
    use crate::testing::{self, RecordingLayout};
    use catalog_refs::{CatalogKind, MemoryCatalog, ReferenceSlot, RejectReason};

    #[test]
    fn test_fresh_instance_sockets() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut node = NodeInstance::new(NodeId(1), add).unwrap();
        assert!(node.inputs().is_empty());

        let report = node.init();
        assert_eq!(node.inputs().identifiers(), vec!["input_a", "input_b"]);
        assert_eq!(node.outputs().identifiers(), vec!["result"]);
        assert_eq!(report.values_added.len(), 3);
        assert!(node.reconcile().is_noop());
    }

    #[test]
    fn test_init_hook_runs_before_reconcile() {
        let registry = testing::registry();
        let node_type = NodeTypeBuilder::new("seeded")
            .input("a", ParameterDecl::float("A"))
            .on_init(|node| {
                assert!(node.inputs().is_empty());
                node.values_mut().set("a", ParamValue::Float(4.0));
                node.values_mut().set("scratch", ParamValue::Bool(true));
            })
            .build(&registry)
            .unwrap();

        let mut node = NodeInstance::new(NodeId(1), node_type).unwrap();
        let report = node.init();

        let socket = node.find_socket(Direction::Input, "a").unwrap();
        assert_eq!(node.socket_value(socket), Some(&ParamValue::Float(4.0)));
        assert_eq!(report.values_dropped, vec!["scratch"]);
        assert!(report.values_added.is_empty());
    }

    #[test]
    fn test_redefined_type_resets_mismatched_values() {
        let registry = testing::registry();
        let v1 = NodeTypeBuilder::new("t")
            .input("x", ParameterDecl::float("X"))
            .build(&registry)
            .unwrap();
        let v2 = NodeTypeBuilder::new("t")
            .input("x", ParameterDecl::vector("X"))
            .build(&registry)
            .unwrap();

        let mut node = NodeInstance::new(NodeId(1), v1).unwrap();
        node.init();
        let uid = node.inputs()[0].uid();

        node.rebind(v2).unwrap();
        let report = node.reconcile();
        assert_eq!(report.values_added, vec!["x"]);
        assert_eq!(node.inputs()[0].uid(), uid);
        assert_eq!(node.inputs()[0].datatype(), "VECTOR");
        assert_eq!(node.values().get("x"), Some(&ParamValue::FloatArray(vec![0.0; 3])));
    }

    #[test]
    fn test_find_socket_and_parameter_errors() {
        let registry = testing::registry();
        let mut node =
            NodeInstance::new(NodeId(3), testing::math_node("m", "M", &registry)).unwrap();
        node.init();

        assert!(matches!(
            node.find_socket(Direction::Output, "input_a"),
            Err(SchemaError::SocketNotFound(_))
        ));
        assert!(matches!(
            node.find_parameter(Direction::Input, "nope"),
            Err(SchemaError::ParameterNotFound { .. })
        ));
        assert_eq!(node.parameters(Direction::Input).len(), 2);
        let uid = node.outputs()[0].uid();
        assert_eq!(node.socket(uid).unwrap().identifier(), "result");
    }

    #[test]
    fn test_socket_draw_and_color() {
        let registry = testing::registry();
        let mut node =
            NodeInstance::new(NodeId(1), testing::math_node("m", "M", &registry)).unwrap();
        node.init();

        let mut layout = RecordingLayout::default();
        let socket = node.inputs()[0].clone();
        socket.draw(&mut layout, &node, "Value").unwrap();
        assert_eq!(layout.ops, vec!["prop(input_a, Value)"]);
        assert_eq!(
            socket.draw_color(&node).unwrap(),
            crate::datatype::DatatypeKind::Float.color()
        );

        let mut linked = socket;
        linked.add_link(crate::socket::SocketAddress::new(NodeId(2), SocketId(0)));
        let mut layout = RecordingLayout::default();
        linked.draw(&mut layout, &node, "Value").unwrap();
        assert_eq!(layout.ops, vec!["label(Value)"]);
    }

    #[test]
    fn test_reference_slots() {
        let registry = testing::registry();
        let node_type = NodeTypeBuilder::new("shade")
            .reference(
                "material",
                ReferenceSlot::new(CatalogKind::Material).never_null(),
            )
            .build(&registry)
            .unwrap();
        let mut catalog = MemoryCatalog::new();
        catalog.insert(CatalogKind::Material, "Foo");

        let mut node = NodeInstance::new(NodeId(1), node_type).unwrap();
        assert_eq!(
            node.set_reference_name("material", "Foo", &mut catalog).unwrap(),
            WriteOutcome::Stored
        );
        assert_eq!(
            node.set_reference("material", None, &mut catalog).unwrap(),
            WriteOutcome::Rejected(RejectReason::NeverNull)
        );
        assert_eq!(
            node.reference("material", &catalog).unwrap().unwrap().name,
            "Foo"
        );

        let mut layout = RecordingLayout::default();
        node.draw_reference(&mut layout, "material", "Material").unwrap();
        assert_eq!(layout.ops.len(), 3);
    }

    #[test]
    fn test_rebind_syncs_reference_slots() {
        let registry = testing::registry();
        let v1 = NodeTypeBuilder::new("t")
            .reference("material", ReferenceSlot::new(CatalogKind::Material))
            .reference("image", ReferenceSlot::new(CatalogKind::Image))
            .build(&registry)
            .unwrap();
        let v2 = NodeTypeBuilder::new("t")
            .reference("image", ReferenceSlot::new(CatalogKind::Image))
            .reference("mesh", ReferenceSlot::new(CatalogKind::Mesh))
            .build(&registry)
            .unwrap();
        let mut catalog = MemoryCatalog::new();
        catalog.insert(CatalogKind::Image, "Grid");

        let mut node = NodeInstance::new(NodeId(1), v1).unwrap();
        node.set_reference_name("image", "Grid", &mut catalog).unwrap();
        node.rebind(v2).unwrap();

        let attrs: Vec<&str> = node.references().attrs().collect();
        assert_eq!(attrs, vec!["image", "mesh"]);
        assert_eq!(node.references().stored_name("image").unwrap(), "Grid");
    }
}
