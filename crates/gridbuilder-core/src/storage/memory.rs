//! In-memory storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::format::GridExport;
use std::collections::HashMap;
use std::sync::RwLock;

/// Keeps layouts in a map. Used by tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryStorage {
    layouts: RwLock<HashMap<String, GridExport>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, layout: &GridExport) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let layout = layout.clone();
        Box::pin(async move {
            self.layouts.write().map_err(lock_error)?.insert(id, layout);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<GridExport>> {
        let id = id.to_string();
        Box::pin(async move {
            let layouts = self.layouts.read().map_err(lock_error)?;
            layouts.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.layouts.write().map_err(lock_error)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let layouts = self.layouts.read().map_err(lock_error)?;
            let mut ids: Vec<String> = layouts.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.layouts.read().map_err(lock_error)?.contains_key(&id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GridState;
    use crate::storage::block_on;

    fn layout() -> GridExport {
        let mut state = GridState::default();
        state.add_canvas("hero");
        state.export()
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        block_on(storage.save("home", &layout())).unwrap();
        let loaded = block_on(storage.load("home")).unwrap();
        assert!(loaded.canvases.contains_key("hero"));
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_delete_and_exists() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("home")).unwrap());
        block_on(storage.save("home", &layout())).unwrap();
        assert!(block_on(storage.exists("home")).unwrap());
        block_on(storage.delete("home")).unwrap();
        assert!(!block_on(storage.exists("home")).unwrap());
        // Deleting twice is fine.
        block_on(storage.delete("home")).unwrap();
    }

    #[test]
    fn test_list_is_sorted() {
        let storage = MemoryStorage::new();
        block_on(storage.save("b", &layout())).unwrap();
        block_on(storage.save("a", &layout())).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
