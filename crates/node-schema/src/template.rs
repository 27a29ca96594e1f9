//! Parameter templates
//!
//! A template holds the static configuration of a parameter (its default
//! value, subtype, display flags) separately from per-instance live values.
//! Node types expose one template per storage-backed parameter so the editor
//! can edit that configuration.
//!
//! Every field change calls back into an [`InterfaceListener`]: the owning
//! node tree marks its interface as needing recomputation. This is the only
//! coupling between template edits and socket reconciliation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::datatype::{DatatypeDescriptor, DatatypeKind};
use crate::error::{Result, SchemaError};
use crate::parameter::{Direction, LinkLimit};
use crate::socket::{Socket, SocketId, SocketList};
use crate::storage::{Options, StorageSlot};
use crate::value::ParamValue;

/// Receives interface invalidation from template updates
pub trait InterfaceListener {
    fn mark_interface_dirty(&mut self);
}

/// Definition of one template field
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateField {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub default: ParamValue,
    /// Allowed `(identifier, name)` choices, empty for free values
    pub items: &'static [(&'static str, &'static str)],
}

impl TemplateField {
    pub fn new(name: &'static str, label: &'static str, default: ParamValue) -> Self {
        Self {
            name,
            label,
            description: "",
            default,
            items: &[],
        }
    }

    /// Subtype choice field, defaulting to `NONE`
    pub fn subtype(items: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            name: "subtype",
            label: "Subtype",
            description: "",
            default: ParamValue::Enum("NONE".to_string()),
            items,
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn validate(&self, value: &ParamValue) -> Result<()> {
        if !self.default.same_shape(value) {
            return Err(SchemaError::InvalidTemplateValue {
                field: self.name.to_string(),
                reason: format!("expected a value shaped like {:?}", self.default),
            });
        }
        if !self.items.is_empty() {
            let id = value.as_str().unwrap_or_default();
            if !self.items.iter().any(|(item, _)| *item == id) {
                return Err(SchemaError::InvalidTemplateValue {
                    field: self.name.to_string(),
                    reason: format!("'{}' is not one of the allowed items", id),
                });
            }
        }
        Ok(())
    }
}

/// Default-editing template for one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTemplate {
    datatype: String,
    kind: DatatypeKind,
    values: BTreeMap<String, ParamValue>,
}

impl ParameterTemplate {
    /// A template with all fields at their defaults
    pub fn new(descriptor: &DatatypeDescriptor) -> Self {
        let values = descriptor
            .template_fields()
            .into_iter()
            .map(|f| (f.name.to_string(), f.default))
            .collect();
        Self {
            datatype: descriptor.tag.clone(),
            kind: descriptor.kind,
            values,
        }
    }

    /// A template seeded from a declared parameter's storage and display flag
    pub fn from_storage(
        descriptor: &DatatypeDescriptor,
        storage: &StorageSlot,
        expand: bool,
    ) -> Self {
        let mut template = Self::new(descriptor);
        for (name, value) in template.values.iter_mut() {
            match name.as_str() {
                "default" if value.same_shape(&storage.default) => {
                    *value = storage.default.clone()
                }
                "subtype" => {
                    let subtype = storage.subtype.clone().unwrap_or_else(|| "NONE".into());
                    *value = ParamValue::Enum(subtype)
                }
                "expand" => *value = ParamValue::Bool(expand),
                _ => {}
            }
        }
        template
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn kind(&self) -> DatatypeKind {
        self.kind
    }

    pub fn fields(&self) -> Vec<TemplateField> {
        self.kind.template_fields()
    }

    pub fn get(&self, field: &str) -> Result<&ParamValue> {
        self.values
            .get(field)
            .ok_or_else(|| self.unknown_field(field))
    }

    /// Set a field and notify the listener that the interface changed
    pub fn set(
        &mut self,
        field: &str,
        value: ParamValue,
        listener: &mut dyn InterfaceListener,
    ) -> Result<()> {
        self.update(field, value)?;
        listener.mark_interface_dirty();
        Ok(())
    }

    /// Validate and store a field value without notifying anyone
    pub fn update(&mut self, field: &str, value: ParamValue) -> Result<()> {
        let definition = self
            .fields()
            .into_iter()
            .find(|f| f.name == field)
            .ok_or_else(|| self.unknown_field(field))?;
        definition.validate(&value)?;

        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Display flag for vector and enum datatypes
    pub fn expand(&self) -> bool {
        self.values
            .get("expand")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Build a storage slot for a new parameter from the current field values
    pub fn make_storage(&self, label: &str) -> Option<StorageSlot> {
        let options: Options = self
            .values
            .iter()
            .filter(|(name, _)| name.as_str() != "expand")
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        self.kind.build_storage(label, &options)
    }

    /// Append a socket for an interface parameter of this datatype
    pub fn make_socket<'a>(
        &self,
        sockets: &'a mut SocketList,
        uid: SocketId,
        direction: Direction,
        identifier: &str,
        name: &str,
    ) -> &'a mut Socket {
        let socket = Socket::new(
            uid,
            identifier,
            name,
            direction,
            self.datatype.clone(),
            LinkLimit::for_direction(direction),
        );
        let index = sockets.push(socket);
        &mut sockets[index]
    }

    /// Refresh an interface socket from this template. Returns whether anything changed.
    pub fn verify_socket(&self, socket: &mut Socket, name: &str) -> bool {
        socket.refresh(name, &self.datatype, LinkLimit::for_direction(socket.direction()))
    }

    fn unknown_field(&self, field: &str) -> SchemaError {
        SchemaError::UnknownTemplateField {
            datatype: self.datatype.clone(),
            field: field.to_string(),
        }
    }
}
