//! Error types for node schemas

use thiserror::Error;

use crate::node::NodeId;
use crate::parameter::Direction;

/// Result type alias using SchemaError
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors that can occur while building schemas or working with node instances
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A declaration referenced a datatype tag that is not registered.
    ///
    /// Raised while building a node type; the type is not created.
    #[error("Unknown datatype '{0}'")]
    UnknownDatatype(String),

    /// No parameter with this identifier in the given direction
    #[error("Parameter '{identifier}' not found in {direction}s")]
    ParameterNotFound {
        identifier: String,
        direction: Direction,
    },

    /// A socket parameter's datatype is outside the node type's socket type
    #[error("Datatype '{datatype}' of '{identifier}' not allowed by socket type '{socket_type}'")]
    DisallowedDatatype {
        identifier: String,
        datatype: String,
        socket_type: String,
    },

    /// No template is installed for this parameter
    #[error("No template for parameter '{0}'")]
    TemplateNotFound(String),

    /// The datatype's template has no field with this name
    #[error("Unknown template field '{field}' for datatype '{datatype}'")]
    UnknownTemplateField { datatype: String, field: String },

    /// A template field was given a value of the wrong shape or outside its items
    #[error("Invalid value for template field '{field}': {reason}")]
    InvalidTemplateValue { field: String, reason: String },

    /// Node type not registered
    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    /// Node not present in the tree
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Socket not present on the node
    #[error("Socket not found: {0}")]
    SocketNotFound(String),

    /// A link between two sockets cannot be made
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// The process-wide datatype registry has not been installed
    #[error("Datatype registry not installed")]
    RegistryNotInstalled,

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Reference slot bookkeeping failed
    #[error(transparent)]
    Reference(#[from] catalog_refs::RefError),
}

impl SchemaError {
    /// Create a parameter-not-found error
    pub fn parameter_not_found(identifier: impl Into<String>, direction: Direction) -> Self {
        Self::ParameterNotFound {
            identifier: identifier.into(),
            direction,
        }
    }

    /// Create an invalid-link error with a message
    pub fn invalid_link(msg: impl Into<String>) -> Self {
        Self::InvalidLink(msg.into())
    }
}
