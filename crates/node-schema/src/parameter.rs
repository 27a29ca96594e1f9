//! Parameter declarations and specifications
//!
//! A [`ParameterDecl`] is what a node type definition writes down: datatype
//! tag, display name, direction and keyword options. Building the node type
//! resolves every declaration against the datatype registry into an
//! immutable [`ParameterSpec`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::datatype::{Color, DatatypeDescriptor, DatatypeKind};
use crate::error::Result;
use crate::registry::DatatypeRegistry;
use crate::render::Layout;
use crate::socket::{Socket, SocketId};
use crate::storage::{Options, StorageSlot};
use crate::value::ValueStore;

/// Direction of a parameter or socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Input, Direction::Output];

    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Maximum number of links a socket accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkLimit {
    Limited(u32),
    Unlimited,
}

impl LinkLimit {
    /// Inputs take exactly one link, outputs any number
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Input => LinkLimit::Limited(1),
            Direction::Output => LinkLimit::Unlimited,
        }
    }

    /// Whether a socket already holding `count` links can take one more
    pub fn allows_another(self, count: usize) -> bool {
        match self {
            LinkLimit::Limited(max) => count < max as usize,
            LinkLimit::Unlimited => true,
        }
    }
}

/// A parameter as written in a node type definition
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    datatype: String,
    name: String,
    direction: Direction,
    use_socket: bool,
    expand: bool,
    options: Options,
}

impl ParameterDecl {
    /// Declare an input parameter of the datatype `tag`
    pub fn new(datatype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            datatype: datatype.into(),
            name: name.into(),
            direction: Direction::Input,
            use_socket: true,
            expand: false,
            options: Options::new(),
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Any.tag(), name)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Float.tag(), name)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Int.tag(), name)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Bool.tag(), name)
    }

    pub fn vector(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Vector.tag(), name)
    }

    pub fn point(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Point.tag(), name)
    }

    pub fn normal(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Normal.tag(), name)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::String.tag(), name)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Enum.tag(), name)
    }

    pub fn color(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Color.tag(), name)
    }

    pub fn matrix(name: impl Into<String>) -> Self {
        Self::new(DatatypeKind::Matrix.tag(), name)
    }

    pub fn output(mut self) -> Self {
        self.direction = Direction::Output;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Keep the parameter (and its storage) but give it no socket
    pub fn without_socket(mut self) -> Self {
        self.use_socket = false;
        self
    }

    /// Expanded display; ignored by datatypes without the flag
    pub fn expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    /// Add one keyword option for the storage factory
    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Merge keyword options for the storage factory
    pub fn options(mut self, options: Options) -> Self {
        self.options.extend(options);
        self
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve against the registry. Fails on an unknown datatype tag.
    pub fn resolve(&self, identifier: &str, registry: &DatatypeRegistry) -> Result<ParameterSpec> {
        let descriptor = registry.lookup(&self.datatype)?;
        let expand = descriptor.supports_expand()
            && (self.expand
                || self
                    .options
                    .get("expand")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false));
        let storage = descriptor.build_storage(&self.name, &self.options);

        Ok(ParameterSpec {
            identifier: identifier.to_string(),
            name: self.name.clone(),
            direction: self.direction,
            descriptor,
            use_socket: self.use_socket,
            expand,
            storage,
        })
    }
}

/// A resolved, immutable parameter of a node type
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    identifier: String,
    name: String,
    direction: Direction,
    descriptor: Arc<DatatypeDescriptor>,
    use_socket: bool,
    expand: bool,
    storage: Option<StorageSlot>,
}

impl ParameterSpec {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Display name
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
        &self.descriptor.tag
    }

    pub fn descriptor(&self) -> &Arc<DatatypeDescriptor> {
        &self.descriptor
    }

    pub fn use_socket(&self) -> bool {
        self.use_socket
    }

    pub fn expand(&self) -> bool {
        self.expand
    }

    pub fn storage(&self) -> Option<&StorageSlot> {
        self.storage.as_ref()
    }

    pub fn color(&self) -> Color {
        self.descriptor.color
    }

    pub fn link_limit(&self) -> LinkLimit {
        LinkLimit::for_direction(self.direction)
    }

    /// Construct a new socket for this parameter
    pub fn make_socket(&self, uid: SocketId) -> Socket {
        Socket::new(
            uid,
            &self.identifier,
            &self.name,
            self.direction,
            self.datatype(),
            self.link_limit(),
        )
    }

    /// Refresh an existing socket in place. Returns whether anything changed.
    pub fn verify_socket(&self, socket: &mut Socket) -> bool {
        socket.refresh(&self.name, self.datatype(), self.link_limit())
    }

    /// Render the live value of this parameter
    pub fn draw_socket(&self, layout: &mut dyn Layout, data: &ValueStore, prop: &str, text: &str) {
        self.descriptor
            .kind
            .draw_socket(layout, data, prop, text, self.expand);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::testing;
    use crate::value::ParamValue;

    #[test]
    fn test_link_limits() {
        assert_eq!(LinkLimit::for_direction(Direction::Input), LinkLimit::Limited(1));
        assert!(LinkLimit::Limited(1).allows_another(0));
        assert!(!LinkLimit::Limited(1).allows_another(1));
        assert!(LinkLimit::Unlimited.allows_another(100));
    }

    #[test]
    fn test_resolve_float() {
        let registry = testing::registry();
        let spec = ParameterDecl::float("Factor")
            .option("default", 0.5)
            .option("items", serde_json::json!(["A"]))
            .resolve("factor", &registry)
            .unwrap();

        assert_eq!(spec.identifier(), "factor");
        assert_eq!(spec.datatype(), "FLOAT");
        assert_eq!(spec.direction(), Direction::Input);
        assert!(spec.use_socket());
        let storage = spec.storage().unwrap();
        assert_eq!(storage.default, ParamValue::Float(0.5));
        assert!(storage.option("items").is_none());
    }

    #[test]
    fn test_resolve_unknown_datatype() {
        let registry = testing::registry();
        let err = ParameterDecl::new("QUATERNION", "Rotation")
            .resolve("rotation", &registry)
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownDatatype(tag) if tag == "QUATERNION"));
    }

    #[test]
    fn test_expand_only_for_supporting_datatypes() {
        let registry = testing::registry();
        let vector = ParameterDecl::vector("Offset")
            .expand(true)
            .resolve("offset", &registry)
            .unwrap();
        let float = ParameterDecl::float("Value")
            .expand(true)
            .resolve("value", &registry)
            .unwrap();
        let generic = ParameterDecl::normal("N")
            .option("expand", true)
            .resolve("n", &registry)
            .unwrap();

        assert!(vector.expand());
        assert!(!float.expand());
        assert!(generic.expand());
    }

    #[test]
    fn test_make_and_verify_socket() {
        let registry = testing::registry();
        let spec = ParameterDecl::int("Count")
            .output()
            .resolve("count", &registry)
            .unwrap();

        let mut socket = spec.make_socket(SocketId(7));
        assert_eq!(socket.identifier(), "count");
        assert_eq!(socket.datatype(), "INT");
        assert_eq!(socket.link_limit(), LinkLimit::Unlimited);
        assert!(!spec.verify_socket(&mut socket));
    }
}
