//! Node types and the node type registry
//!
//! A [`NodeType`] is built once from a [`NodeTypeBuilder`] and shared through
//! `Arc` by every instance. Its schema is frozen at build time. The only
//! mutable part is the table of parameter templates, which the editor edits
//! to change a parameter's static configuration.
//!
//! # Usage
//!
//! ```ignore
//! use node_schema::{DatatypeRegistry, NodeTypeBuilder, ParameterDecl};
//!
//! let registry = DatatypeRegistry::with_builtins();
//! let add = NodeTypeBuilder::new("math.add")
//!     .label("Add")
//!     .input("input_a", ParameterDecl::float("Value"))
//!     .input("input_b", ParameterDecl::float("Value"))
//!     .output("result", ParameterDecl::float("Result"))
//!     .build(&registry)?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use catalog_refs::ReferenceSlot;
use parking_lot::RwLock;

use crate::error::{Result, SchemaError};
use crate::node::NodeInstance;
use crate::parameter::{Direction, ParameterDecl, ParameterSpec};
use crate::registry::DatatypeRegistry;
use crate::render::Layout;
use crate::schema::{NodeSchema, SchemaBuilder};
use crate::socket::SocketTypeSpec;
use crate::template::{InterfaceListener, ParameterTemplate};
use crate::value::ParamValue;

/// User initialization logic, run before socket reconciliation
pub type InitHook = Arc<dyn Fn(&mut NodeInstance) + Send + Sync>;

/// A finalized node type
pub struct NodeType {
    id: String,
    label: String,
    parent: Option<String>,
    schema: Arc<NodeSchema>,
    templates: RwLock<BTreeMap<String, ParameterTemplate>>,
    references: Vec<(String, ReferenceSlot)>,
    init: Option<InitHook>,
    socket_type: SocketTypeSpec,
}

impl NodeType {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Identifier of the type this one inherits from
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn schema(&self) -> &Arc<NodeSchema> {
        &self.schema
    }

    /// Reference slots declared on this type, in declaration order
    pub fn references(&self) -> &[(String, ReferenceSlot)] {
        &self.references
    }

    pub fn find_parameter(&self, direction: Direction, identifier: &str) -> Result<&ParameterSpec> {
        self.schema.find(direction, identifier)
    }

    /// Snapshot of the template of a storage-backed parameter
    pub fn template(&self, identifier: &str) -> Result<ParameterTemplate> {
        self.templates
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| SchemaError::TemplateNotFound(identifier.to_string()))
    }

    pub fn template_identifiers(&self) -> Vec<String> {
        self.templates.read().keys().cloned().collect()
    }

    /// Edit one template field. The listener is told the interface changed.
    ///
    /// The template table is unlocked again before the listener runs.
    pub fn set_template_field(
        &self,
        identifier: &str,
        field: &str,
        value: ParamValue,
        listener: &mut dyn InterfaceListener,
    ) -> Result<()> {
        {
            let mut templates = self.templates.write();
            templates
                .get_mut(identifier)
                .ok_or_else(|| SchemaError::TemplateNotFound(identifier.to_string()))?
                .update(field, value)?;
        }
        listener.mark_interface_dirty();
        Ok(())
    }

    /// Socket type every socket parameter of this type conforms to
    pub fn socket_type(&self) -> &SocketTypeSpec {
        &self.socket_type
    }

    /// Render the template editor of one parameter
    pub fn draw_template(&self, layout: &mut dyn Layout, identifier: &str) -> Result<()> {
        let template = self.template(identifier)?;
        template.kind().draw_template(layout, &template);
        Ok(())
    }

    pub(crate) fn run_init_hook(&self, node: &mut NodeInstance) {
        if let Some(init) = &self.init {
            init(node);
        }
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("parent", &self.parent)
            .field("parameters", &self.schema.identifiers())
            .field("references", &self.references.len())
            .field("has_init", &self.init.is_some())
            .field("socket_type", &self.socket_type.identifier)
            .finish()
    }
}

/// Fluent builder for node types
///
/// Parameters, and reference slots, follow the re-declaration rule: declaring
/// an identifier again moves it to the end.
pub struct NodeTypeBuilder {
    id: String,
    label: String,
    parent: Option<Arc<NodeType>>,
    declarations: SchemaBuilder,
    references: Vec<(String, ReferenceSlot)>,
    init: Option<InitHook>,
    socket_type: Option<SocketTypeSpec>,
}

impl NodeTypeBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            parent: None,
            declarations: SchemaBuilder::new(),
            references: Vec::new(),
            init: None,
            socket_type: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Inherit parameters, reference slots and the init hook of `parent`
    pub fn inherit(mut self, parent: &Arc<NodeType>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare a parameter with the direction set on the declaration
    pub fn param(mut self, identifier: impl Into<String>, decl: ParameterDecl) -> Self {
        self.declarations.declare(identifier, decl);
        self
    }

    pub fn input(self, identifier: impl Into<String>, decl: ParameterDecl) -> Self {
        self.param(identifier, decl.direction(Direction::Input))
    }

    pub fn output(self, identifier: impl Into<String>, decl: ParameterDecl) -> Self {
        self.param(identifier, decl.direction(Direction::Output))
    }

    /// Remove a local declaration
    pub fn remove_param(mut self, identifier: &str) -> Self {
        self.declarations.remove(identifier);
        self
    }

    /// Declare a reference slot
    pub fn reference(mut self, attr: impl Into<String>, slot: ReferenceSlot) -> Self {
        let attr = attr.into();
        self.references.retain(|(a, _)| *a != attr);
        self.references.push((attr, slot));
        self
    }

    /// Restrict socket parameters to the datatypes `spec` allows.
    ///
    /// Without one the parent's socket type applies, or the unrestricted default.
    pub fn socket_type(mut self, spec: SocketTypeSpec) -> Self {
        self.socket_type = Some(spec);
        self
    }

    /// User initialization, run before reconciliation on every new instance
    pub fn on_init(mut self, init: impl Fn(&mut NodeInstance) + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    /// Finalize the schema and install templates.
    ///
    /// Fails without building anything if a declaration uses an unknown datatype
    /// or a socket parameter's datatype is not allowed by the socket type.
    pub fn build(self, registry: &DatatypeRegistry) -> Result<Arc<NodeType>> {
        let parent_schema = self.parent.as_ref().map(|p| p.schema.as_ref());
        let schema = self.declarations.finalize(parent_schema, registry)?;

        let socket_type = self
            .socket_type
            .or_else(|| self.parent.as_ref().map(|p| p.socket_type.clone()))
            .unwrap_or_default();
        if let Some(spec) = schema
            .iter()
            .find(|spec| spec.use_socket() && !socket_type.accepts(spec.datatype()))
        {
            return Err(SchemaError::DisallowedDatatype {
                identifier: spec.identifier().to_string(),
                datatype: spec.datatype().to_string(),
                socket_type: socket_type.identifier.clone(),
            });
        }

        let templates = schema
            .iter()
            .filter_map(|spec| {
                spec.storage().map(|storage| {
                    (
                        spec.identifier().to_string(),
                        ParameterTemplate::from_storage(spec.descriptor(), storage, spec.expand()),
                    )
                })
            })
            .collect();

        let mut references = self
            .parent
            .as_ref()
            .map(|p| p.references.clone())
            .unwrap_or_default();
        for (attr, slot) in self.references {
            references.retain(|(a, _)| *a != attr);
            references.push((attr, slot));
        }

        let init = self
            .init
            .or_else(|| self.parent.as_ref().and_then(|p| p.init.clone()));

        log::debug!(
            "Built node type '{}' with {} parameters",
            self.id,
            schema.len()
        );

        Ok(Arc::new(NodeType {
            id: self.id,
            label: self.label,
            parent: self.parent.map(|p| p.id.clone()),
            schema: Arc::new(schema),
            templates: RwLock::new(templates),
            references,
            init,
            socket_type,
        }))
    }
}

/// Registry of node types keyed by identifier
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    entries: HashMap<String, Arc<NodeType>>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type. Returns the type it replaced, if any.
    ///
    /// Existing instances keep the old type until they are rebound.
    pub fn register(&mut self, node_type: Arc<NodeType>) -> Option<Arc<NodeType>> {
        let id = node_type.id.clone();
        let previous = self.entries.insert(id.clone(), node_type);
        if previous.is_some() {
            log::warn!("Node type '{}' redefined", id);
        } else {
            log::info!("Registered node type '{}'", id);
        }
        previous
    }

    pub fn get(&self, id: &str) -> Result<Arc<NodeType>> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownNodeType(id.to_string()))
    }

    pub fn has_node_type(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// List all registered node type identifiers
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    pub fn all(&self) -> Vec<&Arc<NodeType>> {
        self.entries.values().collect()
    }

    pub fn unregister(&mut self, id: &str) -> Option<Arc<NodeType>> {
        self.entries.remove(id)
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share an identifier.
    pub fn merge(&mut self, other: NodeTypeRegistry) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, RecordingLayout};
    use catalog_refs::CatalogKind;

    #[derive(Default)]
    struct DirtyFlag(bool);

    impl InterfaceListener for DirtyFlag {
        fn mark_interface_dirty(&mut self) {
            self.0 = true;
        }
    }

    #[test]
    fn test_math_node_schema() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);

        assert_eq!(add.label(), "Add");
        assert_eq!(add.schema().identifiers(), vec!["input_a", "input_b", "result"]);
        assert!(add.find_parameter(Direction::Output, "result").is_ok());
        assert!(add.find_parameter(Direction::Input, "result").is_err());
    }

    #[test]
    fn test_templates_installed_for_storage() {
        let registry = testing::registry();
        let node_type = NodeTypeBuilder::new("mix")
            .input("factor", ParameterDecl::float("Factor").option("default", 0.5))
            .input("anything", ParameterDecl::any("Anything"))
            .input("offset", ParameterDecl::vector("Offset").expand(true))
            .build(&registry)
            .unwrap();

        assert_eq!(node_type.template_identifiers(), vec!["factor", "offset"]);
        assert_eq!(
            node_type.template("factor").unwrap().get("default").unwrap(),
            &ParamValue::Float(0.5)
        );
        assert!(node_type.template("offset").unwrap().expand());
        assert!(matches!(
            node_type.template("anything"),
            Err(SchemaError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_set_template_field() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut listener = DirtyFlag::default();

        add.set_template_field("input_a", "default", ParamValue::Float(3.0), &mut listener)
            .unwrap();
        assert!(listener.0);
        assert_eq!(
            add.template("input_a").unwrap().get("default").unwrap(),
            &ParamValue::Float(3.0)
        );

        let mut layout = RecordingLayout::default();
        add.draw_template(&mut layout, "input_a").unwrap();
        assert_eq!(
            layout.ops,
            vec!["template_field(default)", "template_field(subtype)"]
        );
    }

    /// Listener that reads the type's templates while being notified
    struct TemplateReader {
        node_type: Arc<NodeType>,
        seen: Option<ParamValue>,
    }

    impl InterfaceListener for TemplateReader {
        fn mark_interface_dirty(&mut self) {
            let template = self.node_type.template("input_b").unwrap();
            self.seen = Some(template.get("default").unwrap().clone());
        }
    }

    #[test]
    fn test_listener_can_read_templates() {
        let registry = testing::registry();
        let add = testing::math_node("math.add", "Add", &registry);
        let mut reader = TemplateReader {
            node_type: add.clone(),
            seen: None,
        };

        add.set_template_field("input_b", "default", ParamValue::Float(4.0), &mut reader)
            .unwrap();
        assert_eq!(reader.seen, Some(ParamValue::Float(4.0)));
    }

    #[test]
    fn test_socket_type_restricts_datatypes() {
        let registry = testing::registry();
        let shader = SocketTypeSpec::new("ShaderSocket").with_allowed(["COLOR", "FLOAT"]);

        let ok = NodeTypeBuilder::new("tint")
            .socket_type(shader.clone())
            .input("color", ParameterDecl::color("Color"))
            .input("label", ParameterDecl::string("Label").without_socket())
            .output("factor", ParameterDecl::float("Factor"))
            .build(&registry)
            .unwrap();
        assert_eq!(ok.socket_type().identifier, "ShaderSocket");

        let result = NodeTypeBuilder::new("bad")
            .socket_type(shader)
            .input("color", ParameterDecl::color("Color"))
            .input("offset", ParameterDecl::vector("Offset"))
            .build(&registry);
        assert!(matches!(
            result,
            Err(SchemaError::DisallowedDatatype { identifier, datatype, socket_type })
                if identifier == "offset" && datatype == "VECTOR" && socket_type == "ShaderSocket"
        ));

        // Derived types keep the parent's socket type
        let derived = NodeTypeBuilder::new("derived")
            .inherit(&ok)
            .input("count", ParameterDecl::int("Count"))
            .build(&registry);
        assert!(matches!(derived, Err(SchemaError::DisallowedDatatype { .. })));
    }

    #[test]
    fn test_build_fails_on_unknown_datatype() {
        let registry = testing::registry();
        let result = NodeTypeBuilder::new("broken")
            .input("a", ParameterDecl::float("A"))
            .input("q", ParameterDecl::new("QUATERNION", "Q"))
            .build(&registry);
        assert!(matches!(result, Err(SchemaError::UnknownDatatype(_))));
    }

    #[test]
    fn test_inherit() {
        let registry = testing::registry();
        let base = NodeTypeBuilder::new("base")
            .input("a", ParameterDecl::float("A"))
            .output("out", ParameterDecl::float("Out"))
            .reference("material", ReferenceSlot::new(CatalogKind::Material))
            .on_init(|node| {
                node.values_mut().set("a", ParamValue::Float(1.0));
            })
            .build(&registry)
            .unwrap();

        let derived = NodeTypeBuilder::new("derived")
            .inherit(&base)
            .input("b", ParameterDecl::int("B"))
            .input("a", ParameterDecl::float("A"))
            .reference("image", ReferenceSlot::new(CatalogKind::Image))
            .build(&registry)
            .unwrap();

        assert_eq!(derived.parent(), Some("base"));
        assert_eq!(derived.schema().identifiers(), vec!["out", "b", "a"]);
        let refs: Vec<&str> = derived.references().iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(refs, vec!["material", "image"]);
        assert!(format!("{:?}", derived).contains("has_init: true"));
    }

    #[test]
    fn test_node_type_registry() {
        let registry = testing::registry();
        let mut types = NodeTypeRegistry::new();
        assert!(types
            .register(testing::math_node("math.add", "Add", &registry))
            .is_none());
        assert!(types
            .register(testing::math_node("math.add", "Add v2", &registry))
            .is_some());
        assert_eq!(types.get("math.add").unwrap().label(), "Add v2");
        assert!(matches!(
            types.get("math.sub"),
            Err(SchemaError::UnknownNodeType(_))
        ));

        let mut more = NodeTypeRegistry::new();
        more.register(testing::math_node("math.sub", "Subtract", &registry));
        types.merge(more);
        assert_eq!(types.len(), 2);
        assert!(types.has_node_type("math.sub"));
        assert!(types.unregister("math.sub").is_some());
        assert_eq!(types.node_types(), vec!["math.add"]);
    }
}
