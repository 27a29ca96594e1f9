//! Reference storage on a schema-bearing object
//!
//! Each registered slot owns two things: a hidden string field holding the
//! referenced entry's name, and the accessor (the slot declaration) used to
//! read and write it. Both are keyed from the same attribute name through
//! [`storage_key`], so registering and unregistering always touch the same
//! pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogEntry, CatalogKind};
use crate::error::{RefError, Result};
use crate::slot::ReferenceSlot;

/// Key of the hidden name field backing the slot `attr`
pub fn storage_key(attr: &str) -> String {
    format!("{attr}__name__")
}

/// Why a write left the stored name untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Null write on a `never_null` slot holding a name
    NeverNull,
    /// The slot's predicate rejected the entry
    PredicateFailed,
    /// The entry is not present in the slot's catalog
    NotInCatalog,
}

/// Result of a write to a reference slot
///
/// A rejected write is not an error: nothing changes and the previous name
/// stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Stored,
    Cleared,
    Rejected(RejectReason),
}

impl WriteOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, WriteOutcome::Rejected(_))
    }
}

/// Reference slots and their stored names
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    slots: BTreeMap<String, ReferenceSlot>,
    names: BTreeMap<String, String>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot under `attr` with an empty stored name
    pub fn register(&mut self, attr: impl Into<String>, slot: ReferenceSlot) -> Result<()> {
        let attr = attr.into();
        if self.slots.contains_key(&attr) {
            return Err(RefError::DuplicateSlot(attr));
        }
        self.names.insert(storage_key(&attr), String::new());
        self.slots.insert(attr, slot);
        Ok(())
    }

    /// Remove the slot and its stored name together
    pub fn unregister(&mut self, attr: &str) -> Result<ReferenceSlot> {
        let slot = self
            .slots
            .remove(attr)
            .ok_or_else(|| RefError::UnknownSlot(attr.to_string()))?;
        self.names.remove(&storage_key(attr));
        Ok(slot)
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.slots.contains_key(attr)
    }

    /// Registered attribute names, sorted
    pub fn attrs(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, attr: &str) -> Result<&ReferenceSlot> {
        self.slots
            .get(attr)
            .ok_or_else(|| RefError::UnknownSlot(attr.to_string()))
    }

    /// Catalog kind the slot resolves against
    pub fn kind(&self, attr: &str) -> Result<CatalogKind> {
        self.slot(attr).map(|s| s.kind)
    }

    /// The raw stored name, empty when unset. Does not consult the catalog.
    pub fn stored_name(&self, attr: &str) -> Result<&str> {
        self.slot(attr)?;
        Ok(self
            .names
            .get(&storage_key(attr))
            .map(|n| n.as_str())
            .unwrap_or(""))
    }

    /// Resolve the stored name against the catalog.
    ///
    /// A name that no longer resolves is cleared and `None` is returned.
    pub fn read(&mut self, attr: &str, catalog: &dyn Catalog) -> Result<Option<CatalogEntry>> {
        let kind = self.kind(attr)?;
        let key = storage_key(attr);
        let name = self.names.get(&key).cloned().unwrap_or_default();
        if name.is_empty() {
            return Ok(None);
        }

        match catalog.lookup(kind, &name) {
            Some(entry) => Ok(Some(entry)),
            None => {
                log::debug!(
                    "Reference '{}' points at missing {:?} '{}', clearing",
                    attr,
                    kind,
                    name
                );
                self.names.insert(key, String::new());
                Ok(None)
            }
        }
    }

    /// Assign an entry, or clear the slot with `None`
    pub fn write(
        &mut self,
        attr: &str,
        value: Option<&CatalogEntry>,
        catalog: &mut dyn Catalog,
    ) -> Result<WriteOutcome> {
        let slot = self.slot(attr)?;
        let kind = slot.kind;
        let flags = slot.flags;
        let key = storage_key(attr);

        let Some(entry) = value else {
            let current = self.names.get(&key).map(|n| n.as_str()).unwrap_or("");
            if flags.never_null && !current.is_empty() {
                log::debug!("Refusing to clear never-null reference '{}'", attr);
                return Ok(WriteOutcome::Rejected(RejectReason::NeverNull));
            }
            self.names.insert(key, String::new());
            return Ok(WriteOutcome::Cleared);
        };

        if !slot.accepts(entry) {
            log::debug!("Reference '{}' rejected '{}' by predicate", attr, entry.name);
            return Ok(WriteOutcome::Rejected(RejectReason::PredicateFailed));
        }
        if entry.kind != kind || catalog.lookup(kind, &entry.name).is_none() {
            log::debug!(
                "Reference '{}' rejected '{}': not in {:?} catalog",
                attr,
                entry.name,
                kind
            );
            return Ok(WriteOutcome::Rejected(RejectReason::NotInCatalog));
        }

        if flags.fake_user {
            catalog.set_retained(kind, &entry.name, true);
        }
        self.names.insert(key, entry.name.clone());
        Ok(WriteOutcome::Stored)
    }

    /// Assign by name, as a text field in the editor would.
    ///
    /// An empty name clears (subject to `never_null`); other names must resolve
    /// in the catalog and pass the predicate.
    pub fn set_name(
        &mut self,
        attr: &str,
        name: &str,
        catalog: &mut dyn Catalog,
    ) -> Result<WriteOutcome> {
        if name.is_empty() {
            return self.write(attr, None, catalog);
        }
        let kind = self.kind(attr)?;
        match catalog.lookup(kind, name) {
            Some(entry) => self.write(attr, Some(&entry), catalog),
            None => Ok(WriteOutcome::Rejected(RejectReason::NotInCatalog)),
        }
    }
}
