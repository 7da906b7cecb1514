//! The observable grid document.
//!
//! [`GridStore`] keeps a [`GridState`] inside a [`Store`]. Each command edits
//! the state and then notifies set handlers once for every top-level field
//! whose value actually changed.

use crate::config::GridConfig;
use crate::format::{GridExport, ImportError};
use crate::item::{CanvasId, GridItem, ItemId};
use crate::layout::{GridRect, Viewport};
use crate::state::{CanvasMap, GridState};
use crate::store::{ChangeCallback, Store, StoreState, Unsubscribe, UpdateBridge};

/// Observable top-level fields of the grid document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridKey {
    Canvases,
    SelectedItemId,
    SelectedCanvasId,
    ActiveCanvasId,
    CurrentViewport,
    ShowGrid,
}

impl GridKey {
    pub const ALL: [GridKey; 6] = [
        GridKey::Canvases,
        GridKey::SelectedItemId,
        GridKey::SelectedCanvasId,
        GridKey::ActiveCanvasId,
        GridKey::CurrentViewport,
        GridKey::ShowGrid,
    ];
}

/// Value of one [`GridKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum GridValue {
    Canvases(CanvasMap),
    Id(Option<String>),
    Viewport(Viewport),
    Flag(bool),
}

impl GridValue {
    pub fn as_id(&self) -> Option<&str> {
        match self {
            GridValue::Id(id) => id.as_deref(),
            _ => None,
        }
    }

    pub fn as_canvases(&self) -> Option<&CanvasMap> {
        match self {
            GridValue::Canvases(canvases) => Some(canvases),
            _ => None,
        }
    }
}

impl StoreState for GridState {
    type Key = GridKey;
    type Value = GridValue;

    fn keys(&self) -> Vec<GridKey> {
        GridKey::ALL.to_vec()
    }

    fn get(&self, key: &GridKey) -> GridValue {
        match key {
            GridKey::Canvases => GridValue::Canvases(self.canvases().clone()),
            GridKey::SelectedItemId => GridValue::Id(self.selected_item_id().map(str::to_string)),
            GridKey::SelectedCanvasId => GridValue::Id(self.selected_canvas_id().map(str::to_string)),
            GridKey::ActiveCanvasId => GridValue::Id(self.active_canvas_id().map(str::to_string)),
            GridKey::CurrentViewport => GridValue::Viewport(self.current_viewport()),
            GridKey::ShowGrid => GridValue::Flag(self.show_grid()),
        }
    }

    fn set(&mut self, key: &GridKey, value: GridValue) {
        match (key, value) {
            (GridKey::Canvases, GridValue::Canvases(canvases)) => self.set_canvases_raw(canvases),
            (GridKey::SelectedItemId, GridValue::Id(id)) => self.set_selected_item_raw(id),
            (GridKey::SelectedCanvasId, GridValue::Id(id)) => self.set_selected_canvas_raw(id),
            (GridKey::ActiveCanvasId, GridValue::Id(id)) => self.set_active_canvas_raw(id),
            (GridKey::CurrentViewport, GridValue::Viewport(viewport)) => self.set_viewport(viewport),
            (GridKey::ShowGrid, GridValue::Flag(show)) => self.set_show_grid(show),
            (key, value) => log::warn!("Ignoring {:?} written to {:?}", value, key),
        }
    }
}

/// Shared handle to the observable grid document.
#[derive(Clone)]
pub struct GridStore {
    store: Store<GridState>,
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridStore {
    /// Create a store whose initial and post-reset state follows `config`.
    pub fn new(config: GridConfig) -> Self {
        Self {
            store: Store::new(move || GridState::new(config.clone())),
        }
    }

    /// The underlying store, for subscriptions and raw key access.
    pub fn store(&self) -> &Store<GridState> {
        &self.store
    }

    /// Create an update bridge configured from this store's settings and
    /// attach it.
    pub fn attach_bridge(&self) -> (UpdateBridge<GridKey>, Unsubscribe) {
        let interval = self.store.with_state(|state| state.config().cleanup_interval());
        let bridge = UpdateBridge::new(interval);
        let handle = bridge.attach(&self.store);
        (bridge, handle)
    }

    /// Call `callback` whenever `key` changes or the store resets.
    pub fn on_change(&self, key: GridKey, callback: ChangeCallback<GridValue>) -> Unsubscribe {
        self.store.on_change(key, callback)
    }

    // --- Tracked reads ---

    pub fn canvases(&self) -> CanvasMap {
        match self.store.get(&GridKey::Canvases) {
            GridValue::Canvases(canvases) => canvases,
            _ => CanvasMap::new(),
        }
    }

    fn id(&self, key: GridKey) -> Option<String> {
        match self.store.get(&key) {
            GridValue::Id(id) => id,
            _ => None,
        }
    }

    pub fn active_canvas_id(&self) -> Option<String> {
        self.id(GridKey::ActiveCanvasId)
    }

    pub fn selected_item_id(&self) -> Option<String> {
        self.id(GridKey::SelectedItemId)
    }

    pub fn selected_canvas_id(&self) -> Option<String> {
        self.id(GridKey::SelectedCanvasId)
    }

    pub fn current_viewport(&self) -> Viewport {
        match self.store.get(&GridKey::CurrentViewport) {
            GridValue::Viewport(viewport) => viewport,
            _ => Viewport::default(),
        }
    }

    pub fn show_grid(&self) -> bool {
        matches!(self.store.get(&GridKey::ShowGrid), GridValue::Flag(true))
    }

    /// Whether `canvas_id` is the active canvas.
    pub fn is_canvas_active(&self, canvas_id: &str) -> bool {
        self.active_canvas_id().as_deref() == Some(canvas_id)
    }

    // --- Untracked reads ---

    /// Run `f` against the current state without notifying get handlers.
    ///
    /// `f` must not call commands on this store; run them after `read`
    /// returns.
    pub fn read<R>(&self, f: impl FnOnce(&GridState) -> R) -> R {
        self.store.with_state(f)
    }

    pub fn snapshot(&self) -> GridState {
        self.store.snapshot()
    }

    pub fn find_item(&self, item_id: &str) -> Option<GridItem> {
        self.read(|state| state.find_item(item_id).cloned())
    }

    // --- Commands ---

    pub fn set_active_canvas(&self, canvas_id: impl Into<CanvasId>) {
        let canvas_id = canvas_id.into();
        self.store.update(|state| state.set_active_canvas(canvas_id));
    }

    pub fn select_item(&self, canvas_id: impl Into<CanvasId>, item_id: impl Into<ItemId>) {
        let (canvas_id, item_id) = (canvas_id.into(), item_id.into());
        self.store.update(|state| state.select_item(canvas_id, item_id));
    }

    pub fn clear_selection(&self) {
        self.store.update(GridState::clear_selection);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.store.update(|state| state.set_viewport(viewport));
    }

    pub fn toggle_grid(&self) {
        self.store.update(GridState::toggle_grid);
    }

    pub fn add_canvas(&self, canvas_id: impl Into<CanvasId>) -> bool {
        let canvas_id = canvas_id.into();
        self.store.update(|state| state.add_canvas(canvas_id))
    }

    pub fn remove_canvas(&self, canvas_id: &str) -> bool {
        self.store.update(|state| state.remove_canvas(canvas_id).is_some())
    }

    pub fn set_background_color(&self, canvas_id: &str, color: Option<String>) -> bool {
        self.store.update(|state| state.set_background_color(canvas_id, color))
    }

    pub fn add_item(&self, canvas_id: &str, item: GridItem) -> Option<ItemId> {
        self.store.update(|state| state.add_item(canvas_id, item))
    }

    pub fn update_item(&self, item_id: &str, edit: impl FnOnce(&mut GridItem)) -> bool {
        self.store.update(|state| state.update_item(item_id, edit))
    }

    pub fn rename_item(&self, item_id: &str, name: Option<String>) -> bool {
        self.store.update(|state| state.rename_item(item_id, name))
    }

    pub fn set_item_layout(&self, item_id: &str, viewport: Viewport, rect: GridRect) -> bool {
        self.store.update(|state| state.set_item_layout(item_id, viewport, rect))
    }

    pub fn reset_mobile_layout(&self, item_id: &str) -> bool {
        self.store.update(|state| state.reset_mobile_layout(item_id))
    }

    pub fn remove_item(&self, item_id: &str) -> Option<GridItem> {
        self.store.update(|state| state.remove_item(item_id))
    }

    pub fn move_item_to_canvas(&self, item_id: &str, target: &str) -> bool {
        self.store.update(|state| state.move_item_to_canvas(item_id, target))
    }

    pub fn bring_to_front(&self, canvas_id: &str, item_id: &str) -> bool {
        self.store.update(|state| state.bring_to_front(canvas_id, item_id))
    }

    pub fn bring_forward(&self, canvas_id: &str, item_id: &str) -> bool {
        self.store.update(|state| state.bring_forward(canvas_id, item_id))
    }

    pub fn send_backward(&self, canvas_id: &str, item_id: &str) -> bool {
        self.store.update(|state| state.send_backward(canvas_id, item_id))
    }

    pub fn send_to_back(&self, canvas_id: &str, item_id: &str) -> bool {
        self.store.update(|state| state.send_to_back(canvas_id, item_id))
    }

    pub fn undo(&self) -> bool {
        self.store.update(GridState::undo)
    }

    pub fn redo(&self) -> bool {
        self.store.update(GridState::redo)
    }

    /// Restore the initial document and notify reset handlers.
    pub fn reset(&self) {
        log::info!("Resetting grid store");
        self.store.reset();
    }

    /// Notify dispose handlers, then reset.
    pub fn dispose(&self) {
        self.store.dispose();
    }

    // --- Persistence ---

    pub fn export(&self) -> GridExport {
        self.read(GridState::export)
    }

    /// Validate and import a layout payload. Nothing changes on error.
    pub fn import_json(&self, json: &str) -> Result<(), ImportError> {
        let layout = GridExport::from_json(json).inspect_err(|e| log::warn!("Rejected layout import: {}", e))?;
        self.import(layout);
        Ok(())
    }

    pub fn import(&self, layout: GridExport) {
        self.store.update(|state| state.import(layout));
    }
}
