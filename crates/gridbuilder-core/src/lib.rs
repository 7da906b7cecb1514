//! GridBuilder Core Library
//!
//! Canvas and item layouts, z-ordering, selection and the observable store
//! that tells the UI which parts of the grid document changed.

pub mod canvas;
pub mod config;
pub mod format;
pub mod grid_store;
pub mod history;
pub mod item;
pub mod layout;
pub mod state;
pub mod storage;
pub mod store;

pub use canvas::Canvas;
pub use config::{ConfigError, GridConfig};
pub use format::{FORMAT_VERSION, GridExport, ImportError, validate_import};
pub use grid_store::{GridKey, GridStore, GridValue};
pub use history::History;
pub use item::{CanvasId, GridItem, ItemId};
pub use layout::{GridRect, ItemLayouts, MobileLayout, Viewport};
pub use state::{CanvasMap, GridState};
pub use storage::{AutoSaveManager, FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{Element, Store, StoreState, Unsubscribe, UpdateBridge};
