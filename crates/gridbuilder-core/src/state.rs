//! The grid document and the commands that mutate it.
//!
//! `GridState` is an owned value: hosts create one (usually through
//! [`GridStore`](crate::GridStore)) and every mutation goes through the
//! methods below. Commands aimed at a missing canvas or item do nothing and
//! report `false`/`None`.

use crate::canvas::Canvas;
use crate::config::GridConfig;
use crate::history::History;
use crate::item::{CanvasId, GridItem, ItemId};
use crate::layout::{GridRect, MobileLayout, Viewport};
use std::collections::BTreeMap;

/// All canvases keyed by id.
pub type CanvasMap = BTreeMap<CanvasId, Canvas>;

/// The grid builder document.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    canvases: CanvasMap,
    selected_item_id: Option<ItemId>,
    selected_canvas_id: Option<CanvasId>,
    active_canvas_id: Option<CanvasId>,
    current_viewport: Viewport,
    show_grid: bool,
    history: History<CanvasMap>,
    config: GridConfig,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridState {
    /// Create the initial state described by `config`.
    pub fn new(config: GridConfig) -> Self {
        let canvases = config
            .initial_canvases
            .iter()
            .map(|id| (id.clone(), Canvas::new()))
            .collect();
        Self {
            canvases,
            selected_item_id: None,
            selected_canvas_id: None,
            active_canvas_id: None,
            current_viewport: config.initial_viewport,
            show_grid: config.show_grid,
            history: History::new(config.max_undo_history),
            config,
        }
    }

    /// Restore the initial shape: canvases, selection, activation and history.
    pub fn reset(&mut self) {
        log::info!("Resetting grid state");
        *self = Self::new(self.config.clone());
    }

    // --- Accessors ---

    /// The configuration this state was built from.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// All canvases, ordered by id.
    pub fn canvases(&self) -> &CanvasMap {
        &self.canvases
    }

    /// Look up a canvas by id.
    pub fn canvas(&self, id: &str) -> Option<&Canvas> {
        self.canvases.get(id)
    }

    /// Item shown in the config panel.
    pub fn selected_item_id(&self) -> Option<&str> {
        self.selected_item_id.as_deref()
    }

    /// Canvas of the selected item.
    pub fn selected_canvas_id(&self) -> Option<&str> {
        self.selected_canvas_id.as_deref()
    }

    /// The canvas holding interaction focus. May name a canvas that does
    /// not exist.
    pub fn active_canvas_id(&self) -> Option<&str> {
        self.active_canvas_id.as_deref()
    }

    /// Viewport whose layouts are being edited.
    pub fn current_viewport(&self) -> Viewport {
        self.current_viewport
    }

    /// Whether grid lines are drawn.
    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    /// Whether `canvas_id` is the active canvas.
    pub fn is_canvas_active(&self, canvas_id: &str) -> bool {
        self.active_canvas_id.as_deref() == Some(canvas_id)
    }

    /// Find an item in any canvas.
    pub fn find_item(&self, item_id: &str) -> Option<&GridItem> {
        self.canvases.values().find_map(|canvas| canvas.item(item_id))
    }

    /// The canvas currently holding `item_id`.
    pub fn canvas_of(&self, item_id: &str) -> Option<&str> {
        self.canvases
            .iter()
            .find(|(_, canvas)| canvas.contains(item_id))
            .map(|(id, _)| id.as_str())
    }

    /// The item the config panel is editing, if it still exists.
    pub fn selected_item(&self) -> Option<&GridItem> {
        let canvas = self.canvases.get(self.selected_canvas_id.as_deref()?)?;
        canvas.item(self.selected_item_id.as_deref()?)
    }

    /// Number of items across all canvases.
    pub fn item_count(&self) -> usize {
        self.canvases.values().map(Canvas::len).sum()
    }

    fn item_mut(&mut self, item_id: &str) -> Option<&mut GridItem> {
        self.canvases
            .values_mut()
            .find_map(|canvas| canvas.item_mut(item_id))
    }

    // --- Activation, selection and view ---

    /// Make `canvas_id` the single active canvas. The id is not checked
    /// against existing canvases.
    pub fn set_active_canvas(&mut self, canvas_id: impl Into<CanvasId>) {
        let canvas_id = canvas_id.into();
        log::debug!("set_active_canvas {:?}", canvas_id);
        self.active_canvas_id = Some(canvas_id);
    }

    /// Point the config panel at an item. Independent of activation.
    pub fn select_item(&mut self, canvas_id: impl Into<CanvasId>, item_id: impl Into<ItemId>) {
        self.selected_canvas_id = Some(canvas_id.into());
        self.selected_item_id = Some(item_id.into());
    }

    /// Deselect without touching activation.
    pub fn clear_selection(&mut self) {
        self.selected_item_id = None;
        self.selected_canvas_id = None;
    }

    /// Switch viewport. Activation and selection are left as they are.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.current_viewport = viewport;
    }

    /// Show or hide grid lines.
    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    /// Flip grid line visibility.
    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    // --- Undo/redo ---

    /// Run a canvas edit, recording an undo snapshot if it reports a change.
    fn with_undo(&mut self, edit: impl FnOnce(&mut Self) -> bool) -> bool {
        let before = self.canvases.clone();
        let changed = edit(self);
        if changed {
            self.history.record(before);
        }
        changed
    }

    /// Whether a canvas edit can be undone.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether an undone edit can be replayed.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo the last canvas edit.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.canvases.clone()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone canvas edit.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.canvases.clone()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    /// Swap in a history snapshot. Z-index counters of canvases present on
    /// both sides keep the higher value, so no z-index is handed out twice.
    fn restore(&mut self, mut snapshot: CanvasMap) {
        for (id, canvas) in snapshot.iter_mut() {
            if let Some(current) = self.canvases.get(id) {
                canvas.z_index_counter = canvas.z_index_counter.max(current.z_index_counter);
            }
        }
        self.canvases = snapshot;
        self.drop_stale_selection();
    }

    fn drop_stale_selection(&mut self) {
        if self.selected_item_id.is_some() && self.selected_item().is_none() {
            self.clear_selection();
        }
    }

    // --- Canvas CRUD ---

    /// Add an empty canvas. Returns false if the id is taken.
    pub fn add_canvas(&mut self, canvas_id: impl Into<CanvasId>) -> bool {
        let canvas_id = canvas_id.into();
        if self.canvases.contains_key(&canvas_id) {
            return false;
        }
        self.with_undo(|state| {
            log::debug!("add_canvas {}", canvas_id);
            state.canvases.insert(canvas_id, Canvas::new());
            true
        })
    }

    /// Remove a canvas and its items. A selection pointing into it is
    /// cleared; activation is not touched.
    pub fn remove_canvas(&mut self, canvas_id: &str) -> Option<Canvas> {
        if !self.canvases.contains_key(canvas_id) {
            return None;
        }
        let before = self.canvases.clone();
        let removed = self.canvases.remove(canvas_id)?;
        self.history.record(before);
        if self.selected_canvas_id.as_deref() == Some(canvas_id) {
            self.clear_selection();
        }
        self.drop_stale_selection();
        log::debug!("remove_canvas {} ({} items)", canvas_id, removed.len());
        Some(removed)
    }

    /// Set or clear a canvas background. Returns false if unchanged or the
    /// canvas is missing.
    pub fn set_background_color(&mut self, canvas_id: &str, color: Option<String>) -> bool {
        match self.canvases.get_mut(canvas_id) {
            Some(canvas) if canvas.background_color != color => {
                canvas.background_color = color;
                true
            }
            _ => false,
        }
    }

    // --- Item CRUD ---

    /// Place an item on top of `canvas_id`.
    ///
    /// Returns `None` if the canvas does not exist or the item id is
    /// already used anywhere in the document.
    pub fn add_item(&mut self, canvas_id: &str, mut item: GridItem) -> Option<ItemId> {
        if !self.canvases.contains_key(canvas_id) || self.find_item(&item.id).is_some() {
            return None;
        }
        let id = item.id.clone();
        item.canvas_id = canvas_id.to_string();
        self.with_undo(|state| match state.canvases.get_mut(canvas_id) {
            Some(canvas) => {
                canvas.push_item(item);
                true
            }
            None => false,
        });
        log::debug!("add_item {} to {}", id, canvas_id);
        Some(id)
    }

    /// Edit an item in place. Identity, ownership and stacking are
    /// restored after `edit` runs; use the dedicated commands for those.
    pub fn update_item(&mut self, item_id: &str, edit: impl FnOnce(&mut GridItem)) -> bool {
        let Some(current) = self.find_item(item_id) else {
            return false;
        };
        let mut updated = current.clone();
        edit(&mut updated);
        updated.id = current.id.clone();
        updated.canvas_id = current.canvas_id.clone();
        updated.z_index = current.z_index;
        if &updated == current {
            return false;
        }
        self.with_undo(|state| match state.item_mut(item_id) {
            Some(item) => {
                *item = updated;
                true
            }
            None => false,
        })
    }

    /// Set or clear the user-facing label.
    pub fn rename_item(&mut self, item_id: &str, name: Option<String>) -> bool {
        self.update_item(item_id, |item| item.name = name)
    }

    /// Store a rectangle for one viewport. Writing mobile marks it customized.
    pub fn set_item_layout(&mut self, item_id: &str, viewport: Viewport, rect: GridRect) -> bool {
        self.update_item(item_id, |item| item.layouts.set_rect(viewport, rect))
    }

    /// Hand the mobile position back to auto-stacking.
    pub fn reset_mobile_layout(&mut self, item_id: &str) -> bool {
        self.update_item(item_id, |item| item.layouts.mobile = MobileLayout::default())
    }

    /// Remove an item, clearing the selection if it pointed at it.
    pub fn remove_item(&mut self, item_id: &str) -> Option<GridItem> {
        let canvas_id = self.canvas_of(item_id)?.to_string();
        let before = self.canvases.clone();
        let removed = self.canvases.get_mut(&canvas_id)?.remove_item(item_id)?;
        self.history.record(before);
        if self.selected_item_id.as_deref() == Some(item_id) {
            self.clear_selection();
        }
        log::debug!("remove_item {} from {}", item_id, canvas_id);
        Some(removed)
    }

    /// Move an item to another canvas, on top of that canvas's stack.
    pub fn move_item_to_canvas(&mut self, item_id: &str, target: &str) -> bool {
        let Some(source) = self.canvas_of(item_id).map(str::to_string) else {
            return false;
        };
        if source == target || !self.canvases.contains_key(target) {
            return false;
        }
        let moved = self.with_undo(|state| {
            let Some(mut item) = state
                .canvases
                .get_mut(&source)
                .and_then(|canvas| canvas.remove_item(item_id))
            else {
                return false;
            };
            item.canvas_id = target.to_string();
            match state.canvases.get_mut(target) {
                Some(canvas) => {
                    canvas.push_item(item);
                    true
                }
                None => false,
            }
        });
        if moved && self.selected_item_id.as_deref() == Some(item_id) {
            self.selected_canvas_id = Some(target.to_string());
        }
        log::debug!("move_item {} from {} to {}", item_id, source, target);
        moved
    }

    // --- Z-order ---

    fn reorder(&mut self, canvas_id: &str, op: impl FnOnce(&mut Canvas) -> bool) -> bool {
        if !self.canvases.contains_key(canvas_id) {
            return false;
        }
        self.with_undo(|state| state.canvases.get_mut(canvas_id).is_some_and(op))
    }

    /// See [`Canvas::bring_to_front`]. Undoable.
    pub fn bring_to_front(&mut self, canvas_id: &str, item_id: &str) -> bool {
        self.reorder(canvas_id, |canvas| canvas.bring_to_front(item_id))
    }

    /// See [`Canvas::bring_forward`]. Undoable.
    pub fn bring_forward(&mut self, canvas_id: &str, item_id: &str) -> bool {
        self.reorder(canvas_id, |canvas| canvas.bring_forward(item_id))
    }

    /// See [`Canvas::send_backward`]. Undoable.
    pub fn send_backward(&mut self, canvas_id: &str, item_id: &str) -> bool {
        self.reorder(canvas_id, |canvas| canvas.send_backward(item_id))
    }

    /// See [`Canvas::send_to_back`]. Undoable.
    pub fn send_to_back(&mut self, canvas_id: &str, item_id: &str) -> bool {
        self.reorder(canvas_id, |canvas| canvas.send_to_back(item_id))
    }

    // --- Bulk replacement ---

    /// Replace every canvas and the viewport at once (used by import).
    /// Selection and activation are cleared; the change is undoable.
    pub(crate) fn replace_document(&mut self, canvases: CanvasMap, viewport: Viewport) {
        let before = std::mem::replace(&mut self.canvases, canvases);
        self.history.record(before);
        self.current_viewport = viewport;
        self.clear_selection();
        self.active_canvas_id = None;
    }

    // Raw field writes for the observable store. No history is recorded.

    pub(crate) fn set_canvases_raw(&mut self, canvases: CanvasMap) {
        self.canvases = canvases;
    }

    pub(crate) fn set_selected_item_raw(&mut self, id: Option<ItemId>) {
        self.selected_item_id = id;
    }

    pub(crate) fn set_selected_canvas_raw(&mut self, id: Option<CanvasId>) {
        self.selected_canvas_id = id;
    }

    pub(crate) fn set_active_canvas_raw(&mut self, id: Option<CanvasId>) {
        self.active_canvas_id = id;
    }
}
