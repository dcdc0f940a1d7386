use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Eisenhower-matrix task prioritisation CLI.
/// Storage defaults to ~/.focus or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "focus", version, about = "Daily focus: prioritise tasks on the Eisenhower matrix")]
pub struct Cli {
    /// Directory holding the JSON data files.
    #[arg(long, global = true, env = "FOCUS_DIR")]
    pub dir: Option<PathBuf>,

    /// Log every store mutation to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
