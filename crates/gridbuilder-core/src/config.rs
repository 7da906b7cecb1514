//! Engine configuration.

use crate::history::DEFAULT_MAX_UNDO_HISTORY;
use crate::item::CanvasId;
use crate::layout::Viewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default debounce for pruning detached elements from the update bridge.
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 2000;

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid config: {0}")]
    Parse(String),
}

/// Tunables for the grid engine. Every field has a default, so a partial
/// JSON file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Canvases present in the initial (and post-reset) state.
    pub initial_canvases: Vec<CanvasId>,
    pub initial_viewport: Viewport,
    pub show_grid: bool,
    pub max_undo_history: usize,
    pub cleanup_interval_ms: u64,
    pub autosave_interval_secs: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            initial_canvases: Vec::new(),
            initial_viewport: Viewport::Desktop,
            show_grid: true,
            max_undo_history: DEFAULT_MAX_UNDO_HISTORY,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
        }
    }
}

impl GridConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}
