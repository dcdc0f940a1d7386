//! Runtime configuration for the `focus` shell.
//!
//! The data directory comes from `--dir`, then the `FOCUS_DIR` environment
//! variable (both handled by clap), then `$HOME/.focus`.

use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::storage::JsonDirStore;

/// Name of the directory created under the home directory.
pub const DEFAULT_DIR_NAME: &str = ".focus";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub verbose: bool,
}

impl Config {
    pub fn new(dir: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            data_dir: dir.unwrap_or_else(default_data_dir),
            verbose,
        }
    }

    /// Create the data directory if it doesn't exist.
    pub fn ensure_data_dir(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }

    pub fn store(&self) -> JsonDirStore {
        JsonDirStore::new(&self.data_dir)
    }

    /// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_logging(&self) {
        let level = if self.verbose { Level::DEBUG } else { Level::WARN };
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// `$HOME/.focus`, or `./.focus` when no home directory is set.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(DEFAULT_DIR_NAME)
}
