//! Versioned JSON layout format.
//!
//! ```json
//! { "version": "1.0.0", "viewport": "desktop",
//!   "canvases": { "hero": { "items": [ ... ] } } }
//! ```
//!
//! Imports are all-or-nothing: any deviation rejects the whole payload.

use crate::canvas::Canvas;
use crate::item::{CanvasId, GridItem};
use crate::layout::Viewport;
use crate::state::{CanvasMap, GridState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// The only layout format version this crate reads and writes.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Reasons a layout payload is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(String),
    #[error("Layout must be a JSON object")]
    NotAnObject,
    #[error("Unsupported layout version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),
    #[error("'canvases' must be an object")]
    CanvasesNotObject,
    #[error("Canvas '{0}' has no 'items' array")]
    MissingItems(CanvasId),
    #[error("Canvas '{canvas}', item {index}: invalid or missing '{field}'")]
    InvalidItem {
        canvas: CanvasId,
        index: usize,
        field: &'static str,
    },
    #[error("Malformed layout: {0}")]
    Malformed(String),
}

/// One canvas in the exported layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedCanvas {
    pub items: Vec<GridItem>,
}

/// A persisted layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridExport {
    pub version: String,
    pub viewport: Viewport,
    pub canvases: BTreeMap<CanvasId, ExportedCanvas>,
}

impl GridExport {
    /// Capture the canvases and viewport of a state.
    pub fn from_state(state: &GridState) -> Self {
        let canvases = state
            .canvases()
            .iter()
            .map(|(id, canvas)| {
                (
                    id.clone(),
                    ExportedCanvas {
                        items: canvas.items.clone(),
                    },
                )
            })
            .collect();
        Self {
            version: FORMAT_VERSION.to_string(),
            viewport: state.current_viewport(),
            canvases,
        }
    }

    /// Number of items across all canvases.
    pub fn item_count(&self) -> usize {
        self.canvases.values().map(|c| c.items.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate and parse a layout payload.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        validate_import(json)
    }

    /// Build canvases from the exported items. Each item's `canvas_id` is
    /// forced to the key it is stored under and counters are restored from
    /// the highest z-index.
    pub fn into_canvases(self) -> CanvasMap {
        self.canvases
            .into_iter()
            .map(|(id, exported)| {
                let items = exported
                    .items
                    .into_iter()
                    .map(|mut item| {
                        if item.canvas_id != id {
                            log::warn!(
                                "Item {} claims canvas '{}' but is stored under '{}'",
                                item.id,
                                item.canvas_id,
                                id
                            );
                            item.canvas_id = id.clone();
                        }
                        item
                    })
                    .collect();
                (id, Canvas::from_items(items))
            })
            .collect()
    }
}

fn non_empty_str(item: &Value, field: &str) -> bool {
    item.get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

fn validate_item(canvas: &str, index: usize, item: &Value) -> Result<(), ImportError> {
    let invalid = |field: &'static str| ImportError::InvalidItem {
        canvas: canvas.to_string(),
        index,
        field,
    };

    if !item.is_object() {
        return Err(invalid("item"));
    }
    for field in ["id", "canvasId", "type"] {
        if !non_empty_str(item, field) {
            return Err(invalid(field));
        }
    }
    let layouts = item.get("layouts").ok_or_else(|| invalid("layouts"))?;
    if !layouts.get("desktop").is_some_and(Value::is_object) {
        return Err(invalid("layouts.desktop"));
    }
    if !layouts.get("mobile").is_some_and(Value::is_object) {
        return Err(invalid("layouts.mobile"));
    }
    let z_index_in_range = item
        .get("zIndex")
        .and_then(Value::as_i64)
        .is_some_and(|z| (1..i64::from(i32::MAX)).contains(&z));
    if !z_index_in_range {
        return Err(invalid("zIndex"));
    }
    if item.get("config").is_none() {
        return Err(invalid("config"));
    }
    Ok(())
}

/// Check a layout payload field by field, then parse it.
pub fn validate_import(json: &str) -> Result<GridExport, ImportError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ImportError::Json(e.to_string()))?;
    let Some(root) = value.as_object() else {
        return Err(ImportError::NotAnObject);
    };

    match root.get("version").and_then(Value::as_str) {
        Some(FORMAT_VERSION) => {}
        Some(other) => return Err(ImportError::UnsupportedVersion(other.to_string())),
        None => return Err(ImportError::UnsupportedVersion("<missing>".to_string())),
    }

    let canvases = root
        .get("canvases")
        .and_then(Value::as_object)
        .ok_or(ImportError::CanvasesNotObject)?;

    match root.get("viewport").and_then(Value::as_str) {
        Some("desktop" | "mobile") => {}
        Some(other) => return Err(ImportError::InvalidViewport(other.to_string())),
        None => return Err(ImportError::InvalidViewport("<missing>".to_string())),
    }

    for (canvas_id, canvas) in canvases {
        let items = canvas
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ImportError::MissingItems(canvas_id.clone()))?;
        for (index, item) in items.iter().enumerate() {
            validate_item(canvas_id, index, item)?;
        }
    }

    serde_json::from_value(value).map_err(|e| ImportError::Malformed(e.to_string()))
}

impl GridState {
    /// Export canvases and viewport in the persisted layout format.
    pub fn export(&self) -> GridExport {
        GridExport::from_state(self)
    }

    /// Replace canvases and viewport with an imported layout. Selection and
    /// activation are cleared; the import can be undone.
    pub fn import(&mut self, layout: GridExport) {
        let viewport = layout.viewport;
        let count = layout.item_count();
        self.replace_document(layout.into_canvases(), viewport);
        log::info!("Imported layout with {} items", count);
    }
}
