//! GridBuilder command-line shell.

pub mod cli;
pub mod commands;

pub use commands::AppError;
