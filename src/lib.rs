//! # Daily Focus
//!
//! An Eisenhower-matrix prioritisation core. Tasks are captured into an
//! inbox, prioritised by importance (1–4) and deadline into one of four
//! quadrants, completed (optionally with the time they actually took) and
//! archived. Categories group subtasks and complete themselves once every
//! subtask is done.
//!
//! ## Key Pieces
//!
//! - **Classification**: [`classify::classify`] maps importance and deadline
//!   to a [`Quadrant`]; [`classify::is_urgent`] decides urgency.
//! - **Store**: [`Database`] owns tasks, categories and the archive and keeps
//!   them consistent across every mutation.
//! - **Propagation**: [`propagate::reconcile`] derives category completion.
//! - **Statistics**: [`stats::aggregate`] folds tasks into a [`StatsSnapshot`].
//! - **Persistence**: [`storage::KeyValueStore`] is the collaborator the store
//!   is loaded from and saved to; [`storage::JsonDirStore`] keeps one JSON
//!   file per key.
//!
//! ## Quick Start
//!
//! ```
//! use daily_focus::{Database, Quadrant};
//!
//! let mut db = Database::default();
//! let mut task = db.capture_task("Write report");
//! assert!(task.quadrant.is_none());
//!
//! task.importance = 3;
//! let task = db.prioritize_task(task).unwrap();
//! assert_eq!(task.quadrant, Some(Quadrant::Q1));
//!
//! db.toggle_complete(task.id).unwrap();
//! db.archive_task(task.id).unwrap();
//! assert_eq!(db.stats().archived_count, 1);
//! ```

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod propagate;
pub mod stats;
pub mod storage;
pub mod task;

pub use db::Database;
pub use error::{Error, Result};
pub use fields::{Deadline, Quadrant, TimeSpan};
pub use stats::{Accuracy, StatsSnapshot};
pub use task::{CategoryTask, Task, TaskId};
