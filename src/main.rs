use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use larder::cli::commands::Cli;
use larder::cli::handlers::{self, Ctx};
use larder::io::data_dir::DataDir;

fn start_dir(cli: &Cli) -> Result<PathBuf, String> {
    match &cli.dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e)),
        None => std::env::current_dir().map_err(|e| format!("cannot read current directory: {}", e)),
    }
}

/// `-v` wins; otherwise `[log] level` from the data directory, if any.
fn init_logging(verbose: bool, start: &std::path::Path) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        DataDir::discover(start)
            .ok()
            .and_then(|d| d.config.log.level.parse().ok())
            .unwrap_or(LevelFilter::WARN)
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let start = match start_dir(&cli) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(cli.verbose, &start);

    let ctx = Ctx {
        start,
        json: cli.json,
    };
    if let Err(e) = handlers::dispatch(cli.command, &ctx) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
