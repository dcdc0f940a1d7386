//! Error types for store operations.

use thiserror::Error;

use crate::task::TaskId;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures an operation reports back to its caller. None of them leave the
/// store in a partially mutated state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No task or category with this id is in the active collection
    #[error("Not found: {0}")]
    NotFound(TaskId),

    /// Importance, hours or minutes outside their accepted range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Only completed tasks can be archived
    #[error("Task {0} is not completed")]
    NotCompleted(TaskId),
}
