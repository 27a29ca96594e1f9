//! Node trees
//!
//! A [`NodeTree`] owns node instances and the links between their sockets.
//! Links are stored on both ends: an output socket lists the inputs it feeds
//! and an input socket lists the output feeding it. The tree keeps both ends
//! consistent when sockets disappear through reconciliation or node removal.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::node::{NodeId, NodeInstance};
use crate::node_type::NodeType;
use crate::parameter::Direction;
use crate::reconcile::ReconcileReport;
use crate::socket::{Socket, SocketAddress};
use crate::template::InterfaceListener;

/// Node instances and their links
#[derive(Debug)]
pub struct NodeTree {
    name: String,
    nodes: BTreeMap<NodeId, NodeInstance>,
    next_node: u64,
    interface_dirty: bool,
}

impl NodeTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeMap::new(),
            next_node: 1,
            interface_dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create and initialize a node of `node_type`
    pub fn add_node(&mut self, node_type: Arc<NodeType>) -> Result<NodeId> {
        let id = NodeId(self.next_node);
        let mut node = NodeInstance::new(id, node_type)?;
        node.init();
        self.next_node += 1;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node together with every link touching it
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeInstance> {
        let node = self.nodes.remove(&id).ok_or(SchemaError::NodeNotFound(id))?;
        for direction in Direction::BOTH {
            for socket in node.sockets(direction).iter() {
                self.sever_peers(SocketAddress::new(id, socket.uid()), socket.links());
            }
        }
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeInstance> {
        self.nodes.get(&id).ok_or(SchemaError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeInstance> {
        self.nodes.get_mut(&id).ok_or(SchemaError::NodeNotFound(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Address of a node's input socket by identifier
    pub fn input_address(&self, node: NodeId, identifier: &str) -> Result<SocketAddress> {
        self.address(node, Direction::Input, identifier)
    }

    /// Address of a node's output socket by identifier
    pub fn output_address(&self, node: NodeId, identifier: &str) -> Result<SocketAddress> {
        self.address(node, Direction::Output, identifier)
    }

    fn address(
        &self,
        node: NodeId,
        direction: Direction,
        identifier: &str,
    ) -> Result<SocketAddress> {
        let socket = self.node(node)?.find_socket(direction, identifier)?;
        Ok(SocketAddress::new(node, socket.uid()))
    }

    pub fn socket(&self, address: SocketAddress) -> Result<&Socket> {
        self.node(address.node)?
            .socket(address.socket)
            .ok_or_else(|| SchemaError::SocketNotFound(format!("{:?}", address)))
    }

    fn socket_mut(&mut self, address: SocketAddress) -> Result<&mut Socket> {
        self.node_mut(address.node)?
            .socket_mut(address.socket)
            .ok_or_else(|| SchemaError::SocketNotFound(format!("{:?}", address)))
    }

    /// Link an output socket to an input socket.
    ///
    /// A socket at its link limit drops its oldest link first, so linking into
    /// an already connected input replaces the old connection. Linking a pair
    /// that is already linked does nothing.
    pub fn link(&mut self, from: SocketAddress, to: SocketAddress) -> Result<()> {
        if from.node == to.node {
            return Err(SchemaError::invalid_link(format!(
                "cannot link {} to itself",
                from.node
            )));
        }
        if !self.socket(from)?.is_output() {
            return Err(SchemaError::invalid_link("source must be an output socket"));
        }
        if self.socket(to)?.is_output() {
            return Err(SchemaError::invalid_link("target must be an input socket"));
        }
        if self.socket(from)?.is_linked_to(to) {
            return Ok(());
        }

        self.make_room(from)?;
        self.make_room(to)?;
        self.socket_mut(from)?.add_link(to);
        self.socket_mut(to)?.add_link(from);
        log::debug!("Linked {:?} -> {:?}", from, to);
        Ok(())
    }

    /// Remove the link between two sockets. Returns whether it existed.
    pub fn unlink(&mut self, from: SocketAddress, to: SocketAddress) -> Result<bool> {
        self.socket(from)?;
        self.socket(to)?;
        let removed = self.socket_mut(from)?.remove_link(to);
        self.socket_mut(to)?.remove_link(from);
        Ok(removed)
    }

    /// All links as `(output, input)` pairs
    pub fn links(&self) -> Vec<(SocketAddress, SocketAddress)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.outputs().iter().flat_map(move |socket| {
                    let from = SocketAddress::new(node.id(), socket.uid());
                    socket.links().iter().map(move |to| (from, *to))
                })
            })
            .collect()
    }

    /// Reconcile one node and drop the far ends of links on removed sockets
    pub fn reconcile_node(&mut self, id: NodeId) -> Result<ReconcileReport> {
        let report = self.node_mut(id)?.reconcile();
        for socket in report.removed_sockets() {
            self.sever_peers(SocketAddress::new(id, socket.uid()), socket.links());
        }
        Ok(report)
    }

    /// Bind a node to another node type and reconcile it
    pub fn rebind_node(&mut self, id: NodeId, node_type: Arc<NodeType>) -> Result<ReconcileReport> {
        self.node_mut(id)?.rebind(node_type)?;
        self.reconcile_node(id)
    }

    /// Rebind every node of the same type identifier to a redefined type
    pub fn refresh_node_type(&mut self, node_type: &Arc<NodeType>) -> Result<Vec<NodeId>> {
        let ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.node_type().id() == node_type.id())
            .map(|n| n.id())
            .collect();
        for id in &ids {
            self.rebind_node(*id, node_type.clone())?;
        }
        Ok(ids)
    }

    pub fn is_interface_dirty(&self) -> bool {
        self.interface_dirty
    }

    /// Re-reconcile every node if a template change marked the interface dirty.
    ///
    /// Returns the number of nodes whose sockets or values changed.
    pub fn update_interface(&mut self) -> Result<usize> {
        if !self.interface_dirty {
            return Ok(0);
        }
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        let mut changed = 0;
        for id in ids {
            if !self.reconcile_node(id)?.is_noop() {
                changed += 1;
            }
        }
        self.interface_dirty = false;
        log::debug!("Updated interface of '{}', {} nodes changed", self.name, changed);
        Ok(changed)
    }

    fn make_room(&mut self, address: SocketAddress) -> Result<()> {
        loop {
            let socket = self.socket(address)?;
            if socket.link_limit().allows_another(socket.links().len()) {
                return Ok(());
            }
            let Some(oldest) = socket.links().first().copied() else {
                return Ok(());
            };
            self.unlink(address, oldest)?;
        }
    }

    /// Remove `address` from the link lists of its former peers
    fn sever_peers(&mut self, address: SocketAddress, peers: &[SocketAddress]) {
        for peer in peers {
            if let Ok(socket) = self.socket_mut(*peer) {
                socket.remove_link(address);
            }
        }
    }
}

impl InterfaceListener for NodeTree {
    fn mark_interface_dirty(&mut self) {
        self.interface_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_type::NodeTypeBuilder;
    use crate::parameter::{LinkLimit, ParameterDecl};
    use crate::testing;
    use crate::value::ParamValue;

    fn two_adds() -> (NodeTree, NodeId, NodeId) {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut tree = NodeTree::new("tree");
        let a = tree.add_node(add.clone()).unwrap();
        let b = tree.add_node(add).unwrap();
        (tree, a, b)
    }

    #[test]
    fn test_add_node_initializes() {
        let (tree, a, _) = two_adds();
        let node = tree.node(a).unwrap();
        assert_eq!(node.inputs().identifiers(), vec!["input_a", "input_b"]);
        assert_eq!(node.outputs().identifiers(), vec!["result"]);
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree.node(NodeId(99)), Err(SchemaError::NodeNotFound(_))));
    }

    #[test]
    fn test_link_rules() {
        let (mut tree, a, b) = two_adds();
        let out_a = tree.output_address(a, "result").unwrap();
        let in_a = tree.input_address(a, "input_a").unwrap();
        let in_b = tree.input_address(b, "input_a").unwrap();
        let out_b = tree.output_address(b, "result").unwrap();

        assert!(matches!(tree.link(out_a, in_a), Err(SchemaError::InvalidLink(_))));
        assert!(matches!(tree.link(in_b, out_a), Err(SchemaError::InvalidLink(_))));

        tree.link(out_a, in_b).unwrap();
        tree.link(out_a, in_b).unwrap();
        assert_eq!(tree.links(), vec![(out_a, in_b)]);
        assert_eq!(tree.socket(in_b).unwrap().link_limit(), LinkLimit::Limited(1));

        // Outputs accept any number of links
        tree.link(out_b, in_a).unwrap();
        let in_b2 = tree.input_address(b, "input_b").unwrap();
        tree.link(out_a, in_b2).unwrap();
        assert_eq!(tree.socket(out_a).unwrap().links(), &[in_b, in_b2]);
    }

    #[test]
    fn test_input_link_replaces_old() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut tree = NodeTree::new("tree");
        let a = tree.add_node(add.clone()).unwrap();
        let b = tree.add_node(add.clone()).unwrap();
        let c = tree.add_node(add).unwrap();

        let out_a = tree.output_address(a, "result").unwrap();
        let out_b = tree.output_address(b, "result").unwrap();
        let in_c = tree.input_address(c, "input_a").unwrap();

        tree.link(out_a, in_c).unwrap();
        tree.link(out_b, in_c).unwrap();

        assert_eq!(tree.socket(in_c).unwrap().links(), &[out_b]);
        assert!(!tree.socket(out_a).unwrap().is_linked());
        assert_eq!(tree.links(), vec![(out_b, in_c)]);
    }

    #[test]
    fn test_unlink_and_remove_node() {
        let (mut tree, a, b) = two_adds();
        let out_a = tree.output_address(a, "result").unwrap();
        let in_b = tree.input_address(b, "input_a").unwrap();
        let in_b2 = tree.input_address(b, "input_b").unwrap();

        tree.link(out_a, in_b).unwrap();
        tree.link(out_a, in_b2).unwrap();
        assert!(tree.unlink(out_a, in_b).unwrap());
        assert!(!tree.unlink(out_a, in_b).unwrap());

        tree.remove_node(b).unwrap();
        assert!(!tree.socket(out_a).unwrap().is_linked());
        assert!(tree.links().is_empty());
        assert!(tree.remove_node(b).is_err());
    }

    #[test]
    fn test_unlink_unknown_target_keeps_links() {
        let (mut tree, a, b) = two_adds();
        let out_a = tree.output_address(a, "result").unwrap();
        let in_b = tree.input_address(b, "input_a").unwrap();
        tree.link(out_a, in_b).unwrap();

        let missing = SocketAddress::new(b, crate::socket::SocketId(999));
        assert!(matches!(tree.unlink(out_a, missing), Err(SchemaError::SocketNotFound(_))));
        let gone = SocketAddress::new(NodeId(42), in_b.socket);
        assert!(matches!(tree.unlink(out_a, gone), Err(SchemaError::NodeNotFound(_))));

        assert_eq!(tree.socket(out_a).unwrap().links(), &[in_b]);
        assert_eq!(tree.links(), vec![(out_a, in_b)]);
    }

    #[test]
    fn test_remove_node_clears_both_directions() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut tree = NodeTree::new("tree");
        let a = tree.add_node(add.clone()).unwrap();
        let b = tree.add_node(add.clone()).unwrap();
        let c = tree.add_node(add).unwrap();

        let out_a = tree.output_address(a, "result").unwrap();
        let in_b = tree.input_address(b, "input_a").unwrap();
        let out_b = tree.output_address(b, "result").unwrap();
        let in_c = tree.input_address(c, "input_b").unwrap();
        tree.link(out_a, in_b).unwrap();
        tree.link(out_b, in_c).unwrap();

        tree.remove_node(b).unwrap();
        assert!(!tree.socket(out_a).unwrap().is_linked());
        assert!(!tree.socket(in_c).unwrap().is_linked());
        assert!(tree.links().is_empty());
    }

    #[test]
    fn test_rebind_severs_links_on_dropped_inputs() {
        let registry = testing::registry();
        let source = NodeTypeBuilder::new("source")
            .output("value", ParameterDecl::float("Value"))
            .build(&registry)
            .unwrap();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut tree = NodeTree::new("tree");
        let src = tree.add_node(source).unwrap();
        let node = tree.add_node(add).unwrap();

        let out = tree.output_address(src, "value").unwrap();
        let in_b = tree.input_address(node, "input_b").unwrap();
        tree.link(out, in_b).unwrap();

        let single = NodeTypeBuilder::new("math.add")
            .input("input_a", ParameterDecl::float("Value"))
            .output("result", ParameterDecl::float("Result"))
            .build(&registry)
            .unwrap();
        let report = tree.rebind_node(node, single).unwrap();

        assert_eq!(report.inputs.removed.len(), 1);
        assert!(!tree.socket(out).unwrap().is_linked());
        assert!(tree.links().is_empty());
    }

    #[test]
    fn test_redefinition_preserves_links() {
        let registry = testing::registry();
        let source = NodeTypeBuilder::new("source")
            .output("value", ParameterDecl::float("Value"))
            .build(&registry)
            .unwrap();
        let add = testing::math_node("math.add", "Add", &registry);

        let mut tree = NodeTree::new("tree");
        let src = tree.add_node(source.clone()).unwrap();
        let src2 = tree.add_node(source).unwrap();
        let node = tree.add_node(add).unwrap();

        let out = tree.output_address(src, "value").unwrap();
        let out2 = tree.output_address(src2, "value").unwrap();
        let in_a = tree.input_address(node, "input_a").unwrap();
        let in_b = tree.input_address(node, "input_b").unwrap();
        tree.link(out, in_a).unwrap();
        tree.link(out2, in_b).unwrap();

        let redefined = NodeTypeBuilder::new("math.add")
            .label("Add")
            .input("input_a", ParameterDecl::float("Value"))
            .input("input_c", ParameterDecl::float("Value"))
            .output("result", ParameterDecl::float("Result"))
            .build(&registry)
            .unwrap();
        assert_eq!(tree.refresh_node_type(&redefined).unwrap(), vec![node]);

        let instance = tree.node(node).unwrap();
        assert_eq!(instance.inputs().identifiers(), vec!["input_a", "input_c"]);
        assert_eq!(instance.inputs()[0].uid(), in_a.socket);
        assert_eq!(instance.inputs()[0].links(), &[out]);
        assert!(!instance.inputs()[1].is_linked());
        assert!(!tree.socket(out2).unwrap().is_linked());
        assert_eq!(tree.links(), vec![(out, in_a)]);
    }

    #[test]
    fn test_template_edit_marks_interface_dirty() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut tree = NodeTree::new("tree");
        tree.add_node(add.clone()).unwrap();
        assert!(!tree.is_interface_dirty());
        assert_eq!(tree.update_interface().unwrap(), 0);

        add.set_template_field("input_a", "default", ParamValue::Float(2.0), &mut tree)
            .unwrap();
        assert!(tree.is_interface_dirty());
        assert_eq!(tree.update_interface().unwrap(), 0);
        assert!(!tree.is_interface_dirty());
    }
}
