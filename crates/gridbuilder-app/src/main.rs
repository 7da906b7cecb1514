use clap::Parser;
use gridbuilder_app::cli::{Cli, Command};
use gridbuilder_app::commands::{self, AppError};
use gridbuilder_core::GridConfig;

fn run(cli: Cli) -> Result<String, AppError> {
    let config = match &cli.config {
        Some(path) => GridConfig::load(path)?,
        None => GridConfig::default(),
    };
    match cli.command {
        Command::Validate { path } => commands::validate(&path),
        Command::Inspect { path } => commands::inspect(&path),
        Command::Reorder(args) => commands::reorder(&args, &config),
        Command::Save { path, id, dir } => commands::save(&path, id, dir, &config),
        Command::List { dir } => commands::list(dir),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
