//! Node Schema - Declarative node types and socket reconciliation
//!
//! This crate lets a node-graph editor define node types as ordered,
//! typed parameter declarations and keeps the sockets of every node instance
//! in line with those declarations. It provides:
//!
//! - A closed set of parameter datatypes with storage, template and render behavior
//! - Node type schemas with inheritance and "re-declare moves to end" ordering
//! - Socket reconciliation that preserves socket identity and links
//! - Node trees that keep both ends of every link consistent
//! - Weak catalog references through the `catalog-refs` crate
//!
//! # Architecture
//!
//! - `DatatypeRegistry`: datatype tag to descriptor, consulted when building node types
//! - `NodeTypeBuilder`: collects declarations and freezes them into a shared `NodeType`
//! - `reconcile`: the per-direction socket synchronization algorithm
//! - `NodeInstance` / `NodeTree`: runtime nodes, sockets and links
//! - `Layout`: the rendering boundary implemented by the host UI
//!
//! # Example
//!
//! ```ignore
//! use node_schema::{DatatypeRegistry, NodeTree, NodeTypeBuilder, ParameterDecl};
//!
//! let registry = DatatypeRegistry::with_builtins();
//! let add = NodeTypeBuilder::new("math.add")
//!     .input("input_a", ParameterDecl::float("Value"))
//!     .input("input_b", ParameterDecl::float("Value"))
//!     .output("result", ParameterDecl::float("Result"))
//!     .build(&registry)?;
//!
//! let mut tree = NodeTree::new("shader");
//! let node = tree.add_node(add)?;
//! ```

pub mod config;
pub mod datatype;
pub mod error;
pub mod global;
pub mod node;
pub mod node_type;
pub mod parameter;
pub mod reconcile;
pub mod registry;
pub mod render;
pub mod schema;
pub mod socket;
pub mod storage;
pub mod template;
pub mod tree;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export key types
pub use config::FrameworkConfig;
pub use datatype::{Color, DatatypeDescriptor, DatatypeKind};
pub use error::{Result, SchemaError};
pub use node::{NodeId, NodeInstance};
pub use node_type::{InitHook, NodeType, NodeTypeBuilder, NodeTypeRegistry};
pub use parameter::{Direction, LinkLimit, ParameterDecl, ParameterSpec};
pub use reconcile::{reconcile_direction, DirectionReport, ReconcileReport};
pub use registry::DatatypeRegistry;
pub use render::{draw_reference, Layout, RowAlignment};
pub use schema::{NodeSchema, SchemaBuilder};
pub use socket::{Socket, SocketAddress, SocketId, SocketList, SocketTypeSpec};
pub use storage::{EnumItem, Options, StorageKind, StorageSlot};
pub use template::{InterfaceListener, ParameterTemplate, TemplateField};
pub use tree::NodeTree;
pub use value::{ParamValue, ValueStore};

// Re-export the reference types node types declare
pub use catalog_refs::{
    Catalog, CatalogEntry, CatalogKind, RefFlags, ReferenceSlot, ReferenceStore, WriteOutcome,
};
