//! # focus - Daily Focus CLI
//!
//! A thin command-line shell over the `daily_focus` library. It loads the
//! task, category and archive collections from a data directory, runs one
//! command and writes the collections back.
//!
//! ## Quick Start
//!
//! ```bash
//! # Capture a task into the inbox
//! focus capture "Write report"
//!
//! # Prioritise it: importance 3, due today -> Q1 (Do Now)
//! focus prioritize "Write report" --importance 3 --due today
//!
//! # Work through the matrix
//! focus list
//! focus complete "Write report" --hours 1 --minutes 15
//! focus archive "Write report"
//!
//! # Group work under a category
//! focus category Errands --importance 1 --due none
//! focus subtask Errands "Buy milk"
//!
//! # See how well you estimate
//! focus stats
//! ```
//!
//! Data is stored in `~/.focus/` (override with `--dir` or `FOCUS_DIR`) as one
//! JSON file per collection.

use clap::Parser;

use daily_focus::config::Config;
use daily_focus::Database;

mod cli;
mod cmd;

use cli::Cli;
use cmd::*;

fn main() {
    let cli = Cli::parse();
    let config = Config::new(cli.dir, cli.verbose);
    config.init_logging();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    if let Err(e) = config.ensure_data_dir() {
        eprintln!(
            "Failed to create data directory {}: {}",
            config.data_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let store = config.store();
    let mut db = Database::load_from(&store);

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Capture { text } => cmd_capture(&mut db, &store, text),

        Commands::Category { text, importance, due } => {
            cmd_category(&mut db, &store, text, importance, due)
        }

        Commands::Subtask { category, text } => cmd_subtask(&mut db, &store, category, text),

        Commands::Prioritize { id, text, importance, due, hours, minutes } => {
            cmd_prioritize(&mut db, &store, id, text, importance, due, hours, minutes)
        }

        Commands::Convert { id, importance, due, subtasks } => {
            cmd_convert(&mut db, &store, id, importance, due, subtasks)
        }

        Commands::EditCategory { id, text, importance, due } => {
            cmd_edit_category(&mut db, &store, id, text, importance, due)
        }

        Commands::Inbox => cmd_inbox(&db),

        Commands::List { quadrant, all } => cmd_list(&db, quadrant, all),

        Commands::Toggle { id } => cmd_toggle(&mut db, &store, id),

        Commands::Complete { id, hours, minutes, elapsed_secs } => {
            cmd_complete(&mut db, &store, id, hours, minutes, elapsed_secs)
        }

        Commands::Archive { id } => cmd_archive(&mut db, &store, id),

        Commands::Delete { id } => cmd_delete(&mut db, &store, id),

        Commands::DeleteCategory { id } => cmd_delete_category(&mut db, &store, id),

        Commands::Stats { archive } => cmd_stats(&db, archive),
    }
}
