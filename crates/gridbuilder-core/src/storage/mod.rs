//! Layout persistence.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, LAST_LAYOUT_KEY, create_autosave_manager, create_default_storage};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::format::{GridExport, ImportError};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Layout not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
    #[error("Stored layout is invalid: {0}")]
    Import(#[from] ImportError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by storage backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A place to keep exported layouts, keyed by layout id.
pub trait Storage: Send + Sync {
    fn save(&self, id: &str, layout: &GridExport) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a layout. Fails with `NotFound` if nothing is stored under `id`.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<GridExport>>;

    /// Delete a layout. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, Waker};

    let mut cx = Context::from_waker(Waker::noop());
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
