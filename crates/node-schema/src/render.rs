//! Rendering boundary
//!
//! The editor's UI toolkit implements [`Layout`]. This crate only decides
//! *what* to draw for a socket, a template or a reference slot and calls into
//! the layout; it never draws anything itself.

use catalog_refs::{storage_key, ReferenceStore};

use crate::error::Result;
use crate::template::ParameterTemplate;
use crate::value::ValueStore;

/// Horizontal alignment of a layout row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAlignment {
    Expand,
    Left,
}

/// Layout surface provided by the host UI
pub trait Layout {
    /// Plain text label
    fn label(&mut self, text: &str);

    /// Editable field for the live value `prop` in `data`
    fn prop(&mut self, data: &ValueStore, prop: &str, text: &str, expand: bool);

    /// Collapsed per-component menu for vector values
    fn component_menu(&mut self, data: &ValueStore, prop: &str, name: &str);

    /// Lay out `content` in a single row
    fn row(&mut self, alignment: RowAlignment, content: &mut dyn FnMut(&mut dyn Layout));

    /// Editable field for one template field
    fn template_field(&mut self, template: &ParameterTemplate, field: &str);

    /// Search field over a catalog collection, editing a hidden name field
    fn prop_search(&mut self, store: &ReferenceStore, name_key: &str, collection: &str, text: &str);
}

/// Draw a reference slot as a search field over its catalog collection
pub fn draw_reference(
    layout: &mut dyn Layout,
    store: &ReferenceStore,
    attr: &str,
    text: &str,
) -> Result<()> {
    let collection = store.kind(attr)?.collection_name();
    let key = storage_key(attr);
    layout.row(RowAlignment::Expand, &mut |row: &mut dyn Layout| {
        row.prop_search(store, &key, collection, text);
    });
    Ok(())
}
