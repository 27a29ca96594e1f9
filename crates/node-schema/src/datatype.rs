//! Parameter datatypes
//!
//! The set of value kinds is closed: every datatype behaves like one of the
//! [`DatatypeKind`] variants. A [`DatatypeDescriptor`] is the registry entry
//! for a datatype: its tag, display data and UI color, with behavior
//! (storage shape, template fields, socket drawing) dispatched on its kind.

use serde::{Deserialize, Serialize};

use crate::render::{Layout, RowAlignment};
use crate::storage::{Options, StorageSlot};
use crate::template::{ParameterTemplate, TemplateField};
use crate::value::{ParamValue, ValueStore};

/// RGBA color, components in 0..=1
pub type Color = [f32; 4];

const NUMBER_SUBTYPES: &[(&str, &str)] = &[
    ("NONE", "None"),
    ("UNSIGNED", "Unsigned"),
    ("PERCENTAGE", "Percentage"),
    ("FACTOR", "Factor"),
    ("ANGLE", "Angle"),
    ("TIME", "Time"),
    ("DISTANCE", "Distance"),
];

const VECTOR_SUBTYPES: &[(&str, &str)] = &[
    ("NONE", "None"),
    ("TRANSLATION", "Translation"),
    ("DIRECTION", "Direction"),
    ("VELOCITY", "Velocity"),
    ("ACCELERATION", "Acceleration"),
    ("EULER", "Euler"),
    ("XYZ", "XYZ"),
];

const STRING_SUBTYPES: &[(&str, &str)] = &[
    ("NONE", "None"),
    ("FILE_PATH", "File Path"),
    ("DIR_PATH", "Directory Path"),
    ("FILE_NAME", "File Name"),
];

/// Behavior class of a datatype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatatypeKind {
    Any,
    Float,
    Int,
    Bool,
    Vector,
    Point,
    Normal,
    String,
    Enum,
    Color,
    Matrix,
}

impl DatatypeKind {
    /// All built-in kinds, in default registration order
    pub const ALL: [DatatypeKind; 11] = [
        DatatypeKind::Any,
        DatatypeKind::Float,
        DatatypeKind::Int,
        DatatypeKind::Bool,
        DatatypeKind::Color,
        DatatypeKind::Vector,
        DatatypeKind::Point,
        DatatypeKind::Normal,
        DatatypeKind::Matrix,
        DatatypeKind::String,
        DatatypeKind::Enum,
    ];

    /// Identifier tag of the built-in datatype
    pub fn tag(self) -> &'static str {
        match self {
            DatatypeKind::Any => "ANY",
            DatatypeKind::Float => "FLOAT",
            DatatypeKind::Int => "INT",
            DatatypeKind::Bool => "BOOL",
            DatatypeKind::Vector => "VECTOR",
            DatatypeKind::Point => "POINT",
            DatatypeKind::Normal => "NORMAL",
            DatatypeKind::String => "STRING",
            DatatypeKind::Enum => "ENUM",
            DatatypeKind::Color => "COLOR",
            DatatypeKind::Matrix => "MATRIX",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DatatypeKind::Any => "Any",
            DatatypeKind::Float => "Float",
            DatatypeKind::Int => "Int",
            DatatypeKind::Bool => "Bool",
            DatatypeKind::Vector => "Vector",
            DatatypeKind::Point => "Point",
            DatatypeKind::Normal => "Normal",
            DatatypeKind::String => "String",
            DatatypeKind::Enum => "Enum",
            DatatypeKind::Color => "Color",
            DatatypeKind::Matrix => "Matrix",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DatatypeKind::Any => "Generic parameter",
            DatatypeKind::Float => "Floating point number",
            DatatypeKind::Int => "Integer number",
            DatatypeKind::Bool => "Boolean value",
            DatatypeKind::Vector => "Generic 3D vector",
            DatatypeKind::Point => "3D position vector",
            DatatypeKind::Normal => "Normalized 3D direction vector",
            DatatypeKind::String => "String",
            DatatypeKind::Enum => "Value from a predefined set of options",
            DatatypeKind::Color => "RGBA color",
            DatatypeKind::Matrix => "4x4 transformation matrix",
        }
    }

    pub fn color(self) -> Color {
        match self {
            DatatypeKind::Any => [0.20, 0.20, 0.20, 1.0],
            DatatypeKind::Float => [0.63, 0.63, 0.63, 1.0],
            DatatypeKind::Int | DatatypeKind::Enum => [0.06, 0.52, 0.15, 1.0],
            DatatypeKind::Bool => [0.70, 0.65, 0.19, 1.0],
            DatatypeKind::Vector | DatatypeKind::Point | DatatypeKind::Normal => {
                [0.39, 0.39, 0.78, 1.0]
            }
            DatatypeKind::String => [1.00, 1.00, 1.00, 1.0],
            DatatypeKind::Color => [0.78, 0.78, 0.16, 1.0],
            DatatypeKind::Matrix => [0.07, 0.59, 0.80, 1.0],
        }
    }

    /// Whether parameters of this kind carry the `expand` display flag
    pub fn supports_expand(self) -> bool {
        matches!(
            self,
            DatatypeKind::Vector | DatatypeKind::Point | DatatypeKind::Normal | DatatypeKind::Enum
        )
    }

    /// Build the storage slot for a parameter of this kind. `Any` has none.
    pub fn build_storage(self, label: &str, options: &Options) -> Option<StorageSlot> {
        let slot = match self {
            DatatypeKind::Any => return None,
            DatatypeKind::Float => StorageSlot::float(label, options),
            DatatypeKind::Int => StorageSlot::int(label, options),
            DatatypeKind::Bool => StorageSlot::bool(label, options),
            DatatypeKind::Vector => StorageSlot::float_vector(label, 3, None, options),
            DatatypeKind::Point => {
                StorageSlot::float_vector(label, 3, Some("TRANSLATION"), options)
            }
            DatatypeKind::Normal => StorageSlot::float_vector(label, 3, Some("DIRECTION"), options),
            DatatypeKind::String => StorageSlot::string(label, options),
            DatatypeKind::Enum => StorageSlot::enumeration(label, options),
            DatatypeKind::Color => StorageSlot::float_vector(label, 4, Some("COLOR"), options),
            DatatypeKind::Matrix => StorageSlot::float_vector(label, 16, Some("MATRIX"), options),
        };
        Some(slot)
    }

    /// Fields of the default-editing template
    pub fn template_fields(self) -> Vec<TemplateField> {
        let default = |value: ParamValue| TemplateField::new("default", "Default", value);
        let expand = || {
            TemplateField::new("expand", "Expand", ParamValue::Bool(false))
                .with_description("Expand items list in the UI")
        };
        match self {
            DatatypeKind::Any => Vec::new(),
            DatatypeKind::Float => vec![
                default(ParamValue::Float(0.0)),
                TemplateField::subtype(NUMBER_SUBTYPES),
            ],
            DatatypeKind::Int => vec![
                default(ParamValue::Int(0)),
                TemplateField::subtype(NUMBER_SUBTYPES),
            ],
            DatatypeKind::Bool => vec![default(ParamValue::Bool(false))],
            DatatypeKind::Vector => vec![
                default(ParamValue::FloatArray(vec![0.0; 3])),
                TemplateField::subtype(VECTOR_SUBTYPES),
                expand(),
            ],
            DatatypeKind::Point | DatatypeKind::Normal => {
                vec![default(ParamValue::FloatArray(vec![0.0; 3])), expand()]
            }
            DatatypeKind::String => vec![
                default(ParamValue::String(String::new())),
                TemplateField::subtype(STRING_SUBTYPES),
            ],
            DatatypeKind::Enum => vec![default(ParamValue::Enum(String::new()))],
            DatatypeKind::Color => vec![default(ParamValue::FloatArray(vec![0.0; 4]))],
            DatatypeKind::Matrix => vec![default(ParamValue::FloatArray(vec![0.0; 16]))],
        }
    }

    /// Render the live value of an unlinked socket
    pub fn draw_socket(
        self,
        layout: &mut dyn Layout,
        data: &ValueStore,
        prop: &str,
        text: &str,
        expand: bool,
    ) {
        match self {
            DatatypeKind::Float | DatatypeKind::Int | DatatypeKind::Bool => {
                layout.prop(data, prop, text, false)
            }
            DatatypeKind::Vector | DatatypeKind::Point | DatatypeKind::Normal => {
                if expand {
                    layout.prop(data, prop, "", true);
                } else {
                    layout.component_menu(data, prop, text);
                }
            }
            DatatypeKind::Enum => layout.prop(data, prop, text, expand),
            DatatypeKind::String => layout.row(RowAlignment::Expand, &mut |row: &mut dyn Layout| {
                row.prop(data, prop, "", false);
                row.label(text);
            }),
            DatatypeKind::Color => layout.row(RowAlignment::Left, &mut |row: &mut dyn Layout| {
                row.prop(data, prop, "", false);
                row.label(text);
            }),
            DatatypeKind::Any | DatatypeKind::Matrix => layout.label(text),
        }
    }

    /// Render the template editor. `expand` is a display flag and not shown.
    pub fn draw_template(self, layout: &mut dyn Layout, template: &ParameterTemplate) {
        for field in self.template_fields() {
            if field.name != "expand" {
                layout.template_field(template, field.name);
            }
        }
    }
}

/// Registry entry for one datatype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatypeDescriptor {
    pub tag: String,
    pub name: String,
    pub description: String,
    /// Socket color in the editor
    pub color: Color,
    pub kind: DatatypeKind,
}

impl DatatypeDescriptor {
    /// Descriptor of a built-in datatype
    pub fn builtin(kind: DatatypeKind) -> Self {
        Self {
            tag: kind.tag().to_string(),
            name: kind.display_name().to_string(),
            description: kind.description().to_string(),
            color: kind.color(),
            kind,
        }
    }

    /// A custom datatype behaving like `kind` under its own tag
    pub fn custom(tag: impl Into<String>, name: impl Into<String>, kind: DatatypeKind) -> Self {
        Self {
            tag: tag.into(),
            name: name.into(),
            description: kind.description().to_string(),
            color: kind.color(),
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn supports_expand(&self) -> bool {
        self.kind.supports_expand()
    }

    pub fn build_storage(&self, label: &str, options: &Options) -> Option<StorageSlot> {
        self.kind.build_storage(label, options)
    }

    pub fn template_fields(&self) -> Vec<TemplateField> {
        self.kind.template_fields()
    }

    /// A fresh template with every field at its default
    pub fn new_template(&self) -> ParameterTemplate {
        ParameterTemplate::new(self)
    }
}
