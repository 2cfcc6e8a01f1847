//! # todo
//!
//! Terminal front end for the tasklist engine.
//!
//! ```bash
//! todo add "Renew passport" --priority high --category Admin --due "in 2w"
//! todo list --sort due
//! todo list --search passport
//! todo toggle renew
//! todo move 3 1
//! todo clear-completed
//! ```
//!
//! Data is stored in `~/.tasklist/` (`todos.json` and `theme.json`).

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tasklist::cli::Cli;
use tasklist::cmd::{self, Commands};
use tasklist::config::Config;
use tasklist::persist::FileStore;
use tasklist::session::Session;

fn main() {
    // Tracing is opt-in via RUST_LOG; invalid filters are ignored.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    // Completions don't need any stored state.
    if let Commands::Completions { shell } = &cli.command {
        cmd::cmd_completions(*shell);
        return;
    }

    let config = match Config::resolve(cli.dir.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.ensure_data_dir() {
        eprintln!("Failed to create data directory {}: {e}", config.data_dir.display());
        std::process::exit(1);
    }

    let mut session = Session::open(FileStore::new(&config.data_dir), config.ambient_theme);
    if let Err(e) = cmd::run(&mut session, cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
