//! Catalog References
//!
//! Weak, name-based pointers from schema-bearing objects (node types, node
//! instances) into external catalogs of named data objects.
//!
//! A reference never holds the catalog entry itself. It stores the entry's
//! name and resolves it against the live catalog on every read. Entries that
//! disappear from the catalog are healed on the next read: the stored name is
//! cleared and the reference reports no value.
//!
//! # Example
//!
//! ```ignore
//! use catalog_refs::{CatalogKind, MemoryCatalog, ReferenceSlot, ReferenceStore};
//!
//! let mut catalog = MemoryCatalog::new();
//! let cube = catalog.insert(CatalogKind::Object, "Cube");
//!
//! let mut refs = ReferenceStore::new();
//! refs.register("target", ReferenceSlot::new(CatalogKind::Object))?;
//! refs.write("target", Some(&cube), &mut catalog)?;
//!
//! catalog.remove(CatalogKind::Object, "Cube");
//! assert!(refs.read("target", &catalog)?.is_none());
//! ```

pub mod catalog;
pub mod error;
pub mod slot;
pub mod store;

pub use catalog::{Catalog, CatalogEntry, CatalogKind, MemoryCatalog};
pub use error::{RefError, Result};
pub use slot::{RefFlags, ReferencePredicate, ReferenceSlot};
pub use store::{storage_key, RejectReason, ReferenceStore, WriteOutcome};
