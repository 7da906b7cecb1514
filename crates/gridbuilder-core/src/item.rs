//! Grid items: one placed component instance on a canvas.

use crate::layout::{GridRect, ItemLayouts, Viewport};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a grid item.
pub type ItemId = String;

/// Identifier of a canvas section.
pub type CanvasId = String;

/// One placed component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    /// Stable identifier, never reused.
    pub id: ItemId,
    /// Owning canvas.
    pub canvas_id: CanvasId,
    /// Component type key, resolved by the host's component registry.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Optional user-facing label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Stacking order, unique within the owning canvas.
    pub z_index: i32,
    pub layouts: ItemLayouts,
    /// Opaque per-type configuration handed to the renderer.
    pub config: serde_json::Value,
}

impl GridItem {
    /// Create an unplaced item with a fresh id.
    ///
    /// `canvas_id` and `z_index` are assigned when the item is added to a canvas.
    pub fn new(component_type: impl Into<String>, desktop: GridRect) -> Self {
        Self {
            id: format!("item-{}", Uuid::new_v4()),
            canvas_id: String::new(),
            component_type: component_type.into(),
            name: None,
            z_index: 0,
            layouts: ItemLayouts::from_desktop(desktop),
            config: serde_json::Value::Object(Default::default()),
        }
    }

    /// Use a specific id instead of a generated one.
    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// The stored rectangle for `viewport`, if any.
    pub fn rect(&self, viewport: Viewport) -> Option<GridRect> {
        self.layouts.rect_for(viewport)
    }
}
