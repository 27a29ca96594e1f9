//! Value storage slots
//!
//! A storage slot describes the field that holds a parameter's live value on
//! each node instance: its shape, default, subtype and the keyword options
//! it was built with. Datatypes build slots through the factories here.
//!
//! Keyword options are plain JSON maps so that one options map can be passed
//! to any datatype. Each storage kind keeps only the keys it recognizes;
//! everything else is dropped without error.

use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// Keyword options for storage construction
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Shape of a storage field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Float,
    Int,
    Bool,
    FloatVector,
    String,
    Enum,
}

impl StorageKind {
    /// Option keys this storage kind accepts
    pub fn recognized_options(self) -> &'static [&'static str] {
        match self {
            StorageKind::Float => &[
                "default", "min", "max", "soft_min", "soft_max", "step", "precision", "subtype",
                "unit", "options",
            ],
            StorageKind::Int => &[
                "default", "min", "max", "soft_min", "soft_max", "step", "subtype", "options",
            ],
            StorageKind::Bool => &["default", "subtype", "options"],
            StorageKind::FloatVector => &[
                "default", "min", "max", "soft_min", "soft_max", "step", "precision", "subtype",
                "unit", "size", "options",
            ],
            StorageKind::String => &["default", "maxlen", "subtype", "options"],
            StorageKind::Enum => &["items", "default", "options"],
        }
    }
}

/// One selectable item of an enum storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
    pub identifier: String,
    pub name: String,
    pub description: String,
}

/// Keep only recognized option keys, minus keys the caller forces itself
pub fn filter_options(kind: StorageKind, options: &Options, forced: &[&str]) -> Options {
    let recognized = kind.recognized_options();
    let mut filtered = Options::new();
    for (key, value) in options {
        if recognized.contains(&key.as_str()) && !forced.contains(&key.as_str()) {
            filtered.insert(key.clone(), value.clone());
        } else {
            log::debug!("Dropping option '{}' unsupported by {:?} storage", key, kind);
        }
    }
    filtered
}

/// Storage field backing a parameter's live value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSlot {
    pub label: String,
    pub kind: StorageKind,
    /// Number of components, 1 for scalars and strings
    pub size: usize,
    pub subtype: Option<String>,
    pub default: ParamValue,
    /// Accepted options, after filtering
    pub options: Options,
}

impl StorageSlot {
    pub fn float(label: &str, options: &Options) -> Self {
        let options = filter_options(StorageKind::Float, options, &[]);
        let default = options.get("default").and_then(|v| v.as_f64()).unwrap_or(0.0);
        Self::build(label, StorageKind::Float, 1, None, ParamValue::Float(default), options)
    }

    pub fn int(label: &str, options: &Options) -> Self {
        let options = filter_options(StorageKind::Int, options, &[]);
        let default = options
            .get("default")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0);
        Self::build(label, StorageKind::Int, 1, None, ParamValue::Int(default), options)
    }

    pub fn bool(label: &str, options: &Options) -> Self {
        let options = filter_options(StorageKind::Bool, options, &[]);
        let default = options.get("default").and_then(|v| v.as_bool()).unwrap_or(false);
        Self::build(label, StorageKind::Bool, 1, None, ParamValue::Bool(default), options)
    }

    /// Fixed-size float array. `size` always wins over options; a `subtype`
    /// given here cannot be overridden by options either.
    pub fn float_vector(
        label: &str,
        size: usize,
        subtype: Option<&str>,
        options: &Options,
    ) -> Self {
        let forced: &[&str] = if subtype.is_some() {
            &["size", "subtype"]
        } else {
            &["size"]
        };
        let options = filter_options(StorageKind::FloatVector, options, forced);
        let default = match options.get("default") {
            Some(serde_json::Value::Array(items)) if items.len() == size => {
                items.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect()
            }
            Some(v) if v.is_number() => vec![v.as_f64().unwrap_or(0.0); size],
            _ => vec![0.0; size],
        };
        Self::build(
            label,
            StorageKind::FloatVector,
            size,
            subtype,
            ParamValue::FloatArray(default),
            options,
        )
    }

    pub fn string(label: &str, options: &Options) -> Self {
        let options = filter_options(StorageKind::String, options, &[]);
        let default = options
            .get("default")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Self::build(label, StorageKind::String, 1, None, ParamValue::String(default), options)
    }

    /// Enum storage. Items come from the `items` option, either as plain
    /// identifiers or as `[identifier, name, description]` triples.
    pub fn enumeration(label: &str, options: &Options) -> Self {
        let options = filter_options(StorageKind::Enum, options, &[]);
        let items = parse_enum_items(options.get("items"));
        let default = options
            .get("default")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| items.first().map(|i| i.identifier.clone()))
            .unwrap_or_default();
        Self::build(label, StorageKind::Enum, 1, None, ParamValue::Enum(default), options)
    }

    fn build(
        label: &str,
        kind: StorageKind,
        size: usize,
        forced_subtype: Option<&str>,
        default: ParamValue,
        options: Options,
    ) -> Self {
        let subtype = forced_subtype
            .map(str::to_string)
            .or_else(|| {
                options
                    .get("subtype")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .filter(|s| s != "NONE");
        Self {
            label: label.to_string(),
            kind,
            size,
            subtype,
            default,
            options,
        }
    }

    /// Look up an accepted option
    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.options.get(key)
    }

    /// Items of an enum storage, empty for other kinds
    pub fn enum_items(&self) -> Vec<EnumItem> {
        match self.kind {
            StorageKind::Enum => parse_enum_items(self.options.get("items")),
            _ => Vec::new(),
        }
    }
}

fn parse_enum_items(value: Option<&serde_json::Value>) -> Vec<EnumItem> {
    let Some(serde_json::Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(id) => Some(EnumItem {
                identifier: id.clone(),
                name: id.clone(),
                description: String::new(),
            }),
            serde_json::Value::Array(parts) => {
                let part = |i: usize| parts.get(i).and_then(|p| p.as_str()).map(str::to_string);
                let identifier = part(0)?;
                Some(EnumItem {
                    name: part(1).unwrap_or_else(|| identifier.clone()),
                    description: part(2).unwrap_or_default(),
                    identifier,
                })
            }
            _ => None,
        })
        .collect()
}
