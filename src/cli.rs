use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::DIR_ENV;

/// Local task list.
/// Data lives in ~/.tasklist unless --dir or TASKLIST_DIR says otherwise.
#[derive(Parser)]
#[command(name = "todo", version, about = "Local task list with priorities, categories and due dates")]
pub struct Cli {
    /// Directory holding the task data.
    #[arg(long, global = true, env = DIR_ENV)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
