//! Node type schemas
//!
//! [`SchemaBuilder`] collects parameter declarations in order. Re-declaring an
//! identifier removes the earlier entry, so the schema order is the order of
//! most recent declarations. [`SchemaBuilder::finalize`] applies the same rule
//! on top of a parent type's finalized schema and produces a frozen
//! [`NodeSchema`].

use crate::error::{Result, SchemaError};
use crate::parameter::{Direction, ParameterDecl, ParameterSpec};
use crate::registry::DatatypeRegistry;

/// Ordered parameter declarations of one node type, before resolution
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    declarations: Vec<(String, ParameterDecl)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter, moving it to the end if already declared
    pub fn declare(&mut self, identifier: impl Into<String>, decl: ParameterDecl) -> &mut Self {
        let identifier = identifier.into();
        self.declarations.retain(|(id, _)| *id != identifier);
        self.declarations.push((identifier, decl));
        self
    }

    /// Drop a local declaration. Returns whether it existed.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.declarations.len();
        self.declarations.retain(|(id, _)| id != identifier);
        self.declarations.len() != before
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.declarations.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Resolve every declaration and merge onto the parent schema.
    ///
    /// Resolution happens before any merging, so an unknown datatype leaves
    /// nothing half built.
    pub fn finalize(
        &self,
        parent: Option<&NodeSchema>,
        registry: &DatatypeRegistry,
    ) -> Result<NodeSchema> {
        let local = self
            .declarations
            .iter()
            .map(|(id, decl)| decl.resolve(id, registry))
            .collect::<Result<Vec<_>>>()?;

        let mut schema = parent.cloned().unwrap_or_default();
        for spec in local {
            schema.parameters.retain(|p| p.identifier() != spec.identifier());
            schema.parameters.push(spec);
        }
        Ok(schema)
    }
}

/// Frozen, ordered parameters of a node type including inherited ones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSchema {
    parameters: Vec<ParameterSpec>,
}

impl NodeSchema {
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterSpec> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// All identifiers in schema order
    pub fn identifiers(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.identifier()).collect()
    }

    pub fn get(&self, identifier: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.identifier() == identifier)
    }

    /// Parameters of one direction in schema order
    pub fn parameters(&self, direction: Direction) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(move |p| p.direction() == direction)
    }

    /// Parameters of one direction that get a socket
    pub fn socket_parameters(&self, direction: Direction) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters(direction).filter(|p| p.use_socket())
    }

    /// Parameters holding a live value
    pub fn stored_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|p| p.storage().is_some())
    }

    /// Look up a parameter by direction and identifier
    pub fn find(&self, direction: Direction, identifier: &str) -> Result<&ParameterSpec> {
        self.parameters(direction)
            .find(|p| p.identifier() == identifier)
            .ok_or_else(|| SchemaError::parameter_not_found(identifier, direction))
    }
}

impl<'a> IntoIterator for &'a NodeSchema {
    type Item = &'a ParameterSpec;
    type IntoIter = std::slice::Iter<'a, ParameterSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}
