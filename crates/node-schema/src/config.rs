//! Framework configuration

use std::io::Read;

use catalog_refs::{CatalogKind, RefFlags, ReferenceSlot};
use serde::{Deserialize, Serialize};

use crate::datatype::DatatypeKind;
use crate::error::Result;
use crate::node_type::NodeTypeBuilder;
use crate::socket::SocketTypeSpec;

/// Startup configuration of the node framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Datatype tags to register, in order
    pub datatypes: Vec<String>,
    /// The generic socket type and the datatypes it may carry
    pub socket_type: SocketTypeSpec,
    /// Flags given to reference slots created through [`reference_slot`](Self::reference_slot)
    pub reference_defaults: RefFlags,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            datatypes: DatatypeKind::ALL.iter().map(|k| k.tag().to_string()).collect(),
            socket_type: SocketTypeSpec::default(),
            reference_defaults: RefFlags::default(),
        }
    }
}

impl FrameworkConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// A node type builder restricted to the configured socket type
    pub fn node_type(&self, id: impl Into<String>) -> NodeTypeBuilder {
        NodeTypeBuilder::new(id).socket_type(self.socket_type.clone())
    }

    /// A reference slot for `kind` carrying the configured default flags
    pub fn reference_slot(&self, kind: CatalogKind) -> ReferenceSlot {
        ReferenceSlot::new(kind).with_flags(self.reference_defaults)
    }
}
