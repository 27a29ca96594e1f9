//! Shared test fixtures

use std::sync::Arc;

use catalog_refs::ReferenceStore;

use crate::node_type::{NodeType, NodeTypeBuilder};
use crate::parameter::ParameterDecl;
use crate::registry::DatatypeRegistry;
use crate::render::{Layout, RowAlignment};
use crate::template::ParameterTemplate;
use crate::value::ValueStore;

/// Layout that records every call as a string
#[derive(Debug, Default)]
pub struct RecordingLayout {
    pub ops: Vec<String>,
}

impl Layout for RecordingLayout {
    fn label(&mut self, text: &str) {
        self.ops.push(format!("label({})", text));
    }

    fn prop(&mut self, _data: &ValueStore, prop: &str, text: &str, expand: bool) {
        if expand {
            self.ops.push(format!("prop({}, {}, expand)", prop, text));
        } else {
            self.ops.push(format!("prop({}, {})", prop, text));
        }
    }

    fn component_menu(&mut self, _data: &ValueStore, prop: &str, name: &str) {
        self.ops.push(format!("component_menu({}, {})", prop, name));
    }

    fn row(&mut self, alignment: RowAlignment, content: &mut dyn FnMut(&mut dyn Layout)) {
        self.ops.push(format!("row({:?})", alignment));
        content(self);
        self.ops.push("end_row".to_string());
    }

    fn template_field(&mut self, _template: &ParameterTemplate, field: &str) {
        self.ops.push(format!("template_field({})", field));
    }

    fn prop_search(
        &mut self,
        _store: &ReferenceStore,
        name_key: &str,
        collection: &str,
        text: &str,
    ) {
        self.ops
            .push(format!("prop_search({}, {}, {})", name_key, collection, text));
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn registry() -> DatatypeRegistry {
    init_logging();
    DatatypeRegistry::with_builtins()
}

/// Two float inputs and one float output, like an "Add" math node
pub fn math_node(id: &str, label: &str, registry: &DatatypeRegistry) -> Arc<NodeType> {
    NodeTypeBuilder::new(id)
        .label(label)
        .input("input_a", ParameterDecl::float("Value"))
        .input("input_b", ParameterDecl::float("Value"))
        .output("result", ParameterDecl::float("Result"))
        .build(registry)
        .unwrap()
}
