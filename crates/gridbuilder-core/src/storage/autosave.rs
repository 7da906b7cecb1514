//! Periodic saving of the current layout.

use crate::config::GridConfig;
use crate::format::GridExport;
use crate::storage::{FileStorage, Storage, StorageResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key under which the most recently saved layout is mirrored.
pub const LAST_LAYOUT_KEY: &str = "__last_layout__";

/// Saves the layout when it is dirty and the interval has elapsed.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    layout_id: String,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>, config: &GridConfig, layout_id: impl Into<String>) -> Self {
        Self {
            storage,
            interval: config.autosave_interval(),
            last_save: None,
            dirty: false,
            layout_id: layout_id.into(),
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn layout_id(&self) -> &str {
        &self.layout_id
    }

    pub fn set_layout_id(&mut self, id: impl Into<String>) {
        self.layout_id = id.into();
    }

    /// Dirty, and either never saved or saved at least one interval ago.
    pub fn should_save(&self) -> bool {
        self.dirty && self.last_save.is_none_or(|last| last.elapsed() >= self.interval)
    }

    /// Save if [`should_save`](Self::should_save). Returns whether it saved.
    pub async fn maybe_save(&mut self, layout: &GridExport) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(layout).await?;
        Ok(true)
    }

    /// Save now, under the layout id and under [`LAST_LAYOUT_KEY`].
    pub async fn save(&mut self, layout: &GridExport) -> StorageResult<()> {
        self.storage.save(&self.layout_id, layout).await?;
        self.storage.save(LAST_LAYOUT_KEY, layout).await?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::debug!("autosaved layout {} ({} items)", self.layout_id, layout.item_count());
        Ok(())
    }

    /// Load a layout and make it the one being saved.
    pub async fn load(&mut self, id: &str) -> StorageResult<GridExport> {
        let layout = self.storage.load(id).await?;
        self.layout_id = id.to_string();
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Ok(layout)
    }

    /// The most recently saved layout, if any.
    pub async fn load_last(&mut self) -> Option<GridExport> {
        match self.storage.load(LAST_LAYOUT_KEY).await {
            Ok(layout) => {
                self.dirty = false;
                self.last_save = Some(Instant::now());
                Some(layout)
            }
            Err(e) => {
                log::debug!("no last layout to restore: {}", e);
                None
            }
        }
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// Saved layout ids, without [`LAST_LAYOUT_KEY`].
    pub async fn list_layouts(&self) -> StorageResult<Vec<String>> {
        let mut ids = self.storage.list().await?;
        ids.retain(|id| id != LAST_LAYOUT_KEY);
        Ok(ids)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        self.storage.exists(id).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// File storage in the default location.
pub fn create_default_storage() -> StorageResult<Arc<FileStorage>> {
    Ok(Arc::new(FileStorage::default_location()?))
}

/// Auto-save manager over the default file storage.
pub fn create_autosave_manager(
    config: &GridConfig,
    layout_id: impl Into<String>,
) -> StorageResult<AutoSaveManager<FileStorage>> {
    Ok(AutoSaveManager::new(create_default_storage()?, config, layout_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GridState;
    use crate::storage::{MemoryStorage, block_on};

    fn manager() -> AutoSaveManager<MemoryStorage> {
        AutoSaveManager::new(Arc::new(MemoryStorage::new()), &GridConfig::default(), "home")
    }

    fn layout(canvas: &str) -> GridExport {
        let mut state = GridState::default();
        state.add_canvas(canvas);
        state.export()
    }

    #[test]
    fn test_autosave_manager_creation() {
        let manager = manager();
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert_eq!(manager.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_autosave_interval_from_config() {
        let config = GridConfig {
            autosave_interval_secs: 5,
            ..GridConfig::default()
        };
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), &config, "home");
        assert_eq!(manager.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_maybe_save_respects_interval() {
        let mut manager = manager();
        manager.mark_dirty();
        assert!(block_on(manager.maybe_save(&layout("a"))).unwrap());
        assert!(!manager.is_dirty());

        manager.mark_dirty();
        assert!(!block_on(manager.maybe_save(&layout("b"))).unwrap());

        manager.set_interval(Duration::ZERO);
        assert!(block_on(manager.maybe_save(&layout("b"))).unwrap());
        let saved = block_on(manager.load("home")).unwrap();
        assert!(saved.canvases.contains_key("b"));
    }

    #[test]
    fn test_autosave_load_last() {
        let mut manager = manager();
        manager.mark_dirty();
        block_on(manager.save(&layout("hero"))).unwrap();

        let mut restored = AutoSaveManager::new(manager.storage().clone(), &GridConfig::default(), "other");
        let loaded = block_on(restored.load_last()).unwrap();
        assert!(loaded.canvases.contains_key("hero"));
    }

    #[test]
    fn test_load_last_without_save() {
        let mut manager = manager();
        assert!(block_on(manager.load_last()).is_none());
    }

    #[test]
    fn test_list_excludes_last_layout_key() {
        let mut manager = manager();
        block_on(manager.save(&layout("hero"))).unwrap();
        let ids = block_on(manager.list_layouts()).unwrap();
        assert_eq!(ids, vec!["home".to_string()]);
        assert!(block_on(manager.exists(LAST_LAYOUT_KEY)).unwrap());
    }
}
