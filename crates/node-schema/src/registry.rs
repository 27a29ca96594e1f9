//! Datatype registry
//!
//! Maps datatype tags to their descriptors. Node type building resolves every
//! parameter declaration through this registry, so an unknown tag stops the
//! node type from being created.
//!
//! # Usage
//!
//! ```ignore
//! use node_schema::{DatatypeDescriptor, DatatypeKind, DatatypeRegistry};
//!
//! let mut registry = DatatypeRegistry::with_builtins();
//! registry.register(DatatypeDescriptor::custom("DISTANCE", "Distance", DatatypeKind::Float));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::FrameworkConfig;
use crate::datatype::{DatatypeDescriptor, DatatypeKind};
use crate::error::{Result, SchemaError};

/// Registry of datatype descriptors, in registration order
#[derive(Debug, Clone, Default)]
pub struct DatatypeRegistry {
    entries: HashMap<String, Arc<DatatypeDescriptor>>,
    order: Vec<String>,
}

impl DatatypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding all eleven built-in datatypes
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in DatatypeKind::ALL {
            registry.register(DatatypeDescriptor::builtin(kind));
        }
        registry
    }

    /// Registry holding only the built-in datatypes listed in the config
    pub fn from_config(config: &FrameworkConfig) -> Result<Self> {
        let mut registry = Self::new();
        for tag in &config.datatypes {
            let kind = DatatypeKind::from_tag(tag)
                .ok_or_else(|| SchemaError::UnknownDatatype(tag.clone()))?;
            registry.register(DatatypeDescriptor::builtin(kind));
        }
        Ok(registry)
    }

    /// Register a datatype. Re-registering a tag replaces the old descriptor.
    pub fn register(&mut self, descriptor: DatatypeDescriptor) {
        let tag = descriptor.tag.clone();
        if self.entries.insert(tag.clone(), Arc::new(descriptor)).is_some() {
            log::warn!("Datatype '{}' re-registered, replacing previous descriptor", tag);
        } else {
            self.order.push(tag);
        }
    }

    /// Remove a datatype. Existing parameter specs keep their descriptor.
    pub fn unregister(&mut self, tag: &str) -> Option<Arc<DatatypeDescriptor>> {
        let removed = self.entries.remove(tag)?;
        self.order.retain(|t| t != tag);
        Some(removed)
    }

    /// Look up a datatype descriptor by tag
    pub fn lookup(&self, tag: &str) -> Result<Arc<DatatypeDescriptor>> {
        self.entries
            .get(tag)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownDatatype(tag.to_string()))
    }

    /// Check if a datatype is registered
    pub fn has_datatype(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// All descriptors in registration order
    pub fn datatypes(&self) -> Vec<&Arc<DatatypeDescriptor>> {
        self.order
            .iter()
            .filter_map(|tag| self.entries.get(tag))
            .collect()
    }

    /// `(tag, name, description)` choices for a datatype selector
    pub fn enum_items(&self) -> Vec<(String, String, String)> {
        self.datatypes()
            .into_iter()
            .map(|d| (d.tag.clone(), d.name.clone(), d.description.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share a tag.
    pub fn merge(&mut self, other: DatatypeRegistry) {
        let DatatypeRegistry { mut entries, order } = other;
        for tag in order {
            if let Some(descriptor) = entries.remove(&tag) {
                if self.entries.insert(tag.clone(), descriptor).is_some() {
                    log::warn!("Datatype '{}' overridden by merge", tag);
                } else {
                    self.order.push(tag);
                }
            }
        }
    }
}
