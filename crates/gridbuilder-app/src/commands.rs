//! Subcommand implementations. Each returns the text to print.

use crate::cli::{ReorderArgs, ReorderOp};
use gridbuilder_core::storage::LAST_LAYOUT_KEY;
use gridbuilder_core::{
    AutoSaveManager, ConfigError, FileStorage, GridConfig, GridExport, GridStore, ImportError, Storage,
    StorageError, validate_import,
};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid layout: {0}")]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn read_layout(path: &Path) -> Result<GridExport, AppError> {
    let json =
        fs::read_to_string(path).map_err(|e| AppError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(validate_import(&json)?)
}

pub fn validate(path: &Path) -> Result<String, AppError> {
    let layout = read_layout(path)?;
    Ok(format!(
        "{}: valid layout, {} canvases, {} items",
        path.display(),
        layout.canvases.len(),
        layout.item_count()
    ))
}

pub fn inspect(path: &Path) -> Result<String, AppError> {
    let layout = read_layout(path)?;
    let viewport = layout.viewport;
    let mut out = format!("viewport: {}\n", viewport);
    for (id, canvas) in layout.into_canvases() {
        let _ = writeln!(out, "canvas {} ({} items)", id, canvas.len());
        for item in canvas.items_by_z() {
            let rect = item
                .rect(viewport)
                .map(|r| format!("{},{} {}x{}", r.x, r.y, r.width, r.height))
                .unwrap_or_else(|| "auto".to_string());
            let _ = writeln!(
                out,
                "  z={:<3} {:<24} {:<12} {}",
                item.z_index,
                item.name.as_deref().unwrap_or(item.id.as_str()),
                item.component_type,
                rect
            );
        }
    }
    Ok(out.trim_end().to_string())
}

pub fn reorder(args: &ReorderArgs, config: &GridConfig) -> Result<String, AppError> {
    let layout = read_layout(&args.path)?;
    let store = GridStore::new(config.clone());
    store.import(layout);

    let (canvas, item) = (args.canvas.as_str(), args.item.as_str());
    let changed = match args.op {
        ReorderOp::Front => store.bring_to_front(canvas, item),
        ReorderOp::Forward => store.bring_forward(canvas, item),
        ReorderOp::Backward => store.send_backward(canvas, item),
        ReorderOp::Back => store.send_to_back(canvas, item),
    };
    if !changed {
        return Ok(format!("{}: no change", item));
    }

    let output = args.output.as_deref().unwrap_or(args.path.as_path());
    let json = store.export().to_json()?;
    fs::write(output, json).map_err(|e| AppError::Io(format!("Failed to write {}: {}", output.display(), e)))?;
    let z_index = store.find_item(item).map(|i| i.z_index).unwrap_or_default();
    Ok(format!("{}: z-index now {}, written to {}", item, z_index, output.display()))
}

fn open_storage(dir: Option<PathBuf>) -> Result<FileStorage, AppError> {
    Ok(match dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    })
}

pub fn save(path: &Path, id: Option<String>, dir: Option<PathBuf>, config: &GridConfig) -> Result<String, AppError> {
    let layout = read_layout(path)?;
    let id = id
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .ok_or_else(|| AppError::Io(format!("Cannot derive a layout id from {}", path.display())))?;

    let storage = Arc::new(open_storage(dir)?);
    let mut manager = AutoSaveManager::new(Arc::clone(&storage), config, id.clone());
    manager.mark_dirty();
    pollster::block_on(manager.save(&layout))?;
    Ok(format!("Saved {} to {}", id, storage.base_path().display()))
}

pub fn list(dir: Option<PathBuf>) -> Result<String, AppError> {
    let storage = open_storage(dir)?;
    let mut ids = pollster::block_on(storage.list())?;
    ids.retain(|id| id != LAST_LAYOUT_KEY);
    Ok(ids.join("\n"))
}
