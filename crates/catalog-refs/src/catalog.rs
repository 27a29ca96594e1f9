//! Catalog boundary
//!
//! The catalog is owned by the host. This module only fixes the set of
//! catalog kinds and the two operations references need from it: lookup by
//! name and toggling the host's "keep even when unused" flag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category of a catalog collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogKind {
    Action,
    Armature,
    Brush,
    Camera,
    Curve,
    Font,
    GreasePencil,
    Group,
    Image,
    Lamp,
    Lattice,
    Library,
    Mask,
    Material,
    Mesh,
    Metaball,
    #[serde(rename = "MOVIECLIP")]
    MovieClip,
    NodeGroup,
    Object,
    Particles,
    Scene,
    Screen,
    Script,
    ShapeKey,
    Sound,
    Speaker,
    Text,
    Texture,
    WindowManager,
    World,
}

impl CatalogKind {
    /// Every catalog kind, in tag order
    pub const ALL: [CatalogKind; 30] = [
        CatalogKind::Action,
        CatalogKind::Armature,
        CatalogKind::Brush,
        CatalogKind::Camera,
        CatalogKind::Curve,
        CatalogKind::Font,
        CatalogKind::GreasePencil,
        CatalogKind::Group,
        CatalogKind::Image,
        CatalogKind::Lamp,
        CatalogKind::Lattice,
        CatalogKind::Library,
        CatalogKind::Mask,
        CatalogKind::Material,
        CatalogKind::Mesh,
        CatalogKind::Metaball,
        CatalogKind::MovieClip,
        CatalogKind::NodeGroup,
        CatalogKind::Object,
        CatalogKind::Particles,
        CatalogKind::Scene,
        CatalogKind::Screen,
        CatalogKind::Script,
        CatalogKind::ShapeKey,
        CatalogKind::Sound,
        CatalogKind::Speaker,
        CatalogKind::Text,
        CatalogKind::Texture,
        CatalogKind::WindowManager,
        CatalogKind::World,
    ];

    /// Name of the host collection holding entries of this kind
    pub fn collection_name(self) -> &'static str {
        match self {
            CatalogKind::Action => "actions",
            CatalogKind::Armature => "armatures",
            CatalogKind::Brush => "brushes",
            CatalogKind::Camera => "cameras",
            CatalogKind::Curve => "curves",
            CatalogKind::Font => "fonts",
            CatalogKind::GreasePencil => "grease_pencil",
            CatalogKind::Group => "groups",
            CatalogKind::Image => "images",
            CatalogKind::Lamp => "lamps",
            CatalogKind::Lattice => "lattices",
            CatalogKind::Library => "libraries",
            CatalogKind::Mask => "masks",
            CatalogKind::Material => "materials",
            CatalogKind::Mesh => "meshes",
            CatalogKind::Metaball => "metaballs",
            CatalogKind::MovieClip => "movieclips",
            CatalogKind::NodeGroup => "node_groups",
            CatalogKind::Object => "objects",
            CatalogKind::Particles => "particles",
            CatalogKind::Scene => "scenes",
            CatalogKind::Screen => "screens",
            CatalogKind::Script => "scripts",
            CatalogKind::ShapeKey => "shape_keys",
            CatalogKind::Sound => "sounds",
            CatalogKind::Speaker => "speakers",
            CatalogKind::Text => "texts",
            CatalogKind::Texture => "textures",
            CatalogKind::WindowManager => "window_managers",
            CatalogKind::World => "worlds",
        }
    }
}

/// A named entry as seen through the catalog boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub kind: CatalogKind,
    pub name: String,
    /// Whether the host keeps the entry even when nothing uses it
    pub retained: bool,
}

impl CatalogEntry {
    pub fn new(kind: CatalogKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            retained: false,
        }
    }
}

/// Host-side catalog of named data objects
///
/// Lookups are by kind and name only; references never cache what they get
/// back beyond the name.
pub trait Catalog {
    /// Look up an entry by kind and name
    fn lookup(&self, kind: CatalogKind, name: &str) -> Option<CatalogEntry>;

    /// Mark an entry as retained (or not) by the host.
    ///
    /// Returns `false` if the entry does not exist.
    fn set_retained(&mut self, kind: CatalogKind, name: &str, retained: bool) -> bool;
}

/// In-memory catalog, used by hosts without a data store of their own and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: BTreeMap<(CatalogKind, String), CatalogEntry>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any entry of the same kind and name
    pub fn insert(&mut self, kind: CatalogKind, name: impl Into<String>) -> CatalogEntry {
        let entry = CatalogEntry::new(kind, name);
        self.entries
            .insert((kind, entry.name.clone()), entry.clone());
        entry
    }

    /// Remove an entry
    pub fn remove(&mut self, kind: CatalogKind, name: &str) -> Option<CatalogEntry> {
        self.entries.remove(&(kind, name.to_string()))
    }

    /// Rename an entry. References holding the old name go stale.
    pub fn rename(&mut self, kind: CatalogKind, old: &str, new: impl Into<String>) -> bool {
        match self.entries.remove(&(kind, old.to_string())) {
            Some(mut entry) => {
                entry.name = new.into();
                self.entries.insert((kind, entry.name.clone()), entry);
                true
            }
            None => false,
        }
    }

    /// Check whether an entry exists
    pub fn contains(&self, kind: CatalogKind, name: &str) -> bool {
        self.entries.contains_key(&(kind, name.to_string()))
    }

    /// Names of all entries of a kind, sorted
    pub fn names(&self, kind: CatalogKind) -> Vec<&str> {
        self.entries
            .values()
            .filter(|e| e.kind == kind)
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn lookup(&self, kind: CatalogKind, name: &str) -> Option<CatalogEntry> {
        self.entries.get(&(kind, name.to_string())).cloned()
    }

    fn set_retained(&mut self, kind: CatalogKind, name: &str, retained: bool) -> bool {
        match self.entries.get_mut(&(kind, name.to_string())) {
            Some(entry) => {
                entry.retained = retained;
                true
            }
            None => false,
        }
    }
}
