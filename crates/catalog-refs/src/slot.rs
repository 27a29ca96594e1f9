//! Reference slot declarations

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, CatalogKind};

/// Validity predicate for catalog entries assigned to a slot
pub type ReferencePredicate = Arc<dyn Fn(&CatalogEntry) -> bool + Send + Sync>;

/// Policy flags of a reference slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefFlags {
    /// Refuse clearing a slot that currently holds a name
    pub never_null: bool,
    /// Mark assigned entries as retained by the host
    pub fake_user: bool,
    /// Whether the stored name may be animated by the host
    pub animatable: bool,
}

impl Default for RefFlags {
    fn default() -> Self {
        Self {
            never_null: false,
            fake_user: true,
            animatable: true,
        }
    }
}

/// Declaration of a weak reference into one catalog kind
#[derive(Clone)]
pub struct ReferenceSlot {
    /// Display name
    pub name: String,
    pub description: String,
    /// Catalog the stored name resolves against
    pub kind: CatalogKind,
    pub flags: RefFlags,
    predicate: Option<ReferencePredicate>,
}

impl ReferenceSlot {
    /// Create a slot with default flags
    pub fn new(kind: CatalogKind) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            kind,
            flags: RefFlags::default(),
            predicate: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flags(mut self, flags: RefFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Refuse null writes while a name is stored
    pub fn never_null(mut self) -> Self {
        self.flags.never_null = true;
        self
    }

    /// Do not mark assigned entries as retained
    pub fn without_fake_user(mut self) -> Self {
        self.flags.fake_user = false;
        self
    }

    /// Only accept entries the predicate approves
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&CatalogEntry) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Check an entry against the validity predicate (entries pass when there is none)
    pub fn accepts(&self, entry: &CatalogEntry) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(entry))
    }
}

impl fmt::Debug for ReferenceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSlot")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
