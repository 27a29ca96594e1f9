//! Sockets and socket lists
//!
//! A [`Socket`] is the runtime connection point of one parameter on one node
//! instance. Sockets are only created, refreshed and removed by reconciliation;
//! the node tree adds and removes their links.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::datatype::Color;
use crate::error::Result;
use crate::node::{NodeId, NodeInstance};
use crate::parameter::{Direction, LinkLimit};
use crate::registry::DatatypeRegistry;
use crate::render::Layout;

/// Unique identifier for a socket within its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketId(pub u64);

/// Fully qualified socket location inside a node tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketAddress {
    pub node: NodeId,
    pub socket: SocketId,
}

impl SocketAddress {
    pub fn new(node: NodeId, socket: SocketId) -> Self {
        Self { node, socket }
    }
}

/// A linkable connection point on a node instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    uid: SocketId,
    identifier: String,
    name: String,
    direction: Direction,
    datatype: String,
    link_limit: LinkLimit,
    links: Vec<SocketAddress>,
}

impl Socket {
    pub(crate) fn new(
        uid: SocketId,
        identifier: impl Into<String>,
        name: impl Into<String>,
        direction: Direction,
        datatype: impl Into<String>,
        link_limit: LinkLimit,
    ) -> Self {
        Self {
            uid,
            identifier: identifier.into(),
            name: name.into(),
            direction,
            datatype: datatype.into(),
            link_limit,
            links: Vec::new(),
        }
    }

    /// Update display data in place, keeping links. Returns whether anything changed.
    pub(crate) fn refresh(&mut self, name: &str, datatype: &str, link_limit: LinkLimit) -> bool {
        let mut changed = false;
        if self.name != name {
            self.name = name.to_string();
            changed = true;
        }
        if self.datatype != datatype {
            self.datatype = datatype.to_string();
            changed = true;
        }
        if self.link_limit != link_limit {
            self.link_limit = link_limit;
            changed = true;
        }
        changed
    }

    pub fn uid(&self) -> SocketId {
        self.uid
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_output(&self) -> bool {
        self.direction.is_output()
    }

    /// Datatype tag
    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn link_limit(&self) -> LinkLimit {
        self.link_limit
    }

    /// Peer sockets this socket is linked to, oldest first
    pub fn links(&self) -> &[SocketAddress] {
        &self.links
    }

    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn is_linked_to(&self, peer: SocketAddress) -> bool {
        self.links.contains(&peer)
    }

    pub(crate) fn add_link(&mut self, peer: SocketAddress) {
        if !self.links.contains(&peer) {
            self.links.push(peer);
        }
    }

    pub(crate) fn remove_link(&mut self, peer: SocketAddress) -> bool {
        let before = self.links.len();
        self.links.retain(|l| *l != peer);
        self.links.len() != before
    }

    pub(crate) fn clear_links(&mut self) -> Vec<SocketAddress> {
        std::mem::take(&mut self.links)
    }

    /// Draw this socket for `node`.
    ///
    /// A linked input only shows its label; its value comes from the link.
    /// Everything else is delegated to the parameter's datatype.
    pub fn draw(&self, layout: &mut dyn Layout, node: &NodeInstance, text: &str) -> Result<()> {
        if !self.is_output() && self.is_linked() {
            layout.label(text);
            return Ok(());
        }
        let spec = node.find_parameter(self.direction, &self.identifier)?;
        spec.draw_socket(layout, node.values(), &self.identifier, text);
        Ok(())
    }

    /// UI color of the socket's parameter datatype
    pub fn draw_color(&self, node: &NodeInstance) -> Result<Color> {
        Ok(node.find_parameter(self.direction, &self.identifier)?.color())
    }
}

/// Restricts which datatypes a socket type may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketTypeSpec {
    pub identifier: String,
    /// Allowed datatype tags, `None` for any registered datatype
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
}

impl SocketTypeSpec {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            allowed: None,
        }
    }

    pub fn with_allowed<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn accepts(&self, datatype: &str) -> bool {
        match &self.allowed {
            Some(tags) => tags.iter().any(|t| t == datatype),
            None => true,
        }
    }

    /// Datatype choice list for this socket type, in registry order
    pub fn datatype_items(&self, registry: &DatatypeRegistry) -> Vec<(String, String, String)> {
        registry
            .enum_items()
            .into_iter()
            .filter(|(tag, _, _)| self.accepts(tag))
            .collect()
    }
}

impl Default for SocketTypeSpec {
    fn default() -> Self {
        Self::new("GenericSocket")
    }
}

/// Ordered sockets of one direction on a node instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketList {
    sockets: Vec<Socket>,
}

impl SocketList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Socket> {
        self.sockets.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Socket> {
        self.sockets.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Socket> {
        self.sockets.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Socket> {
        self.sockets.get_mut(index)
    }

    /// Socket identifiers in list order
    pub fn identifiers(&self) -> Vec<&str> {
        self.sockets.iter().map(|s| s.identifier()).collect()
    }

    pub fn find(&self, identifier: &str) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.identifier == identifier)
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.sockets.iter().position(|s| s.identifier == identifier)
    }

    /// Position of the first socket at or after `start` with this identifier
    pub(crate) fn position_from(&self, start: usize, identifier: &str) -> Option<usize> {
        self.sockets
            .iter()
            .skip(start)
            .position(|s| s.identifier == identifier)
            .map(|offset| start + offset)
    }

    pub fn by_uid(&self, uid: SocketId) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.uid == uid)
    }

    pub fn by_uid_mut(&mut self, uid: SocketId) -> Option<&mut Socket> {
        self.sockets.iter_mut().find(|s| s.uid == uid)
    }

    /// Append a socket, returning its index
    pub(crate) fn push(&mut self, socket: Socket) -> usize {
        self.sockets.push(socket);
        self.sockets.len() - 1
    }

    /// Move the socket at `from` to `to`, shifting the ones in between
    pub(crate) fn move_to(&mut self, from: usize, to: usize) {
        if from != to {
            let socket = self.sockets.remove(from);
            self.sockets.insert(to, socket);
        }
    }

    /// Remove and return every socket from `start` on
    pub(crate) fn truncate_from(&mut self, start: usize) -> Vec<Socket> {
        if start >= self.sockets.len() {
            return Vec::new();
        }
        self.sockets.split_off(start)
    }

    pub(crate) fn remove_uid(&mut self, uid: SocketId) -> Option<Socket> {
        let index = self.sockets.iter().position(|s| s.uid == uid)?;
        Some(self.sockets.remove(index))
    }
}

impl Index<usize> for SocketList {
    type Output = Socket;

    fn index(&self, index: usize) -> &Socket {
        &self.sockets[index]
    }
}

impl IndexMut<usize> for SocketList {
    fn index_mut(&mut self, index: usize) -> &mut Socket {
        &mut self.sockets[index]
    }
}

impl<'a> IntoIterator for &'a SocketList {
    type Item = &'a Socket;
    type IntoIter = std::slice::Iter<'a, Socket>;

    fn into_iter(self) -> Self::IntoIter {
        self.sockets.iter()
    }
}
