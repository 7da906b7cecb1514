//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridbuilder", version, about = "Inspect and edit GridBuilder layout files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Grid configuration file (JSON).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that a layout file can be imported.
    Validate {
        #[arg(value_name = "LAYOUT")]
        path: PathBuf,
    },

    /// Print every canvas with its items in stacking order.
    Inspect {
        #[arg(value_name = "LAYOUT")]
        path: PathBuf,
    },

    /// Change the stacking order of one item.
    Reorder(ReorderArgs),

    /// Copy a layout file into layout storage.
    Save {
        #[arg(value_name = "LAYOUT")]
        path: PathBuf,
        /// Id to store the layout under (default: the file stem).
        #[arg(long)]
        id: Option<String>,
        /// Storage directory (default: the user data directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// List layouts in storage.
    List {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Parser)]
pub struct ReorderArgs {
    #[arg(value_name = "LAYOUT")]
    pub path: PathBuf,

    #[arg(long)]
    pub canvas: String,

    #[arg(long)]
    pub item: String,

    #[arg(long, value_enum)]
    pub op: ReorderOp,

    /// Write the result here instead of overwriting the input.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReorderOp {
    Front,
    Forward,
    Backward,
    Back,
}
