//! Task and category data structures.
//!
//! A `Task` is the unit placed on the Eisenhower matrix. A `CategoryTask`
//! groups tasks but is never placed on the matrix itself; its subtasks point
//! back to it through `Task::parent` and are looked up from the flat task
//! collection rather than stored a second time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::*;

/// Opaque identifier shared by tasks and categories.
pub type TaskId = Uuid;

/// Importance given to freshly captured tasks.
pub const DEFAULT_IMPORTANCE: u8 = 2;

/// Estimate given to freshly captured tasks.
pub const DEFAULT_ESTIMATE_MINUTES: u64 = 30;

/// A prioritisable work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub importance: u8,
    pub estimated: TimeSpan,
    pub deadline: Deadline,
    /// `None` while the task sits in the inbox.
    pub quadrant: Option<Quadrant>,
    #[serde(default)]
    pub completed: bool,
    pub created_at_utc: i64,
    #[serde(default)]
    pub completed_at_utc: Option<i64>,
    #[serde(default)]
    pub actual: Option<TimeSpan>,
    #[serde(default)]
    pub parent: Option<TaskId>,
}

impl Task {
    /// A new inbox task with the capture defaults.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            importance: DEFAULT_IMPORTANCE,
            estimated: TimeSpan::from_minutes(DEFAULT_ESTIMATE_MINUTES),
            deadline: Deadline::Today,
            quadrant: None,
            completed: false,
            created_at_utc: Utc::now().timestamp(),
            completed_at_utc: None,
            actual: None,
            parent: None,
        }
    }

    /// A new inbox task under `category`, inheriting its importance and deadline.
    pub fn new_subtask(category: &CategoryTask, text: impl Into<String>) -> Self {
        Self {
            importance: category.importance,
            deadline: category.deadline,
            parent: Some(category.id),
            ..Self::new(text)
        }
    }

    /// Not yet placed on the matrix.
    pub fn is_inbox(&self) -> bool {
        self.quadrant.is_none()
    }
}

/// A grouping of tasks whose matrix placement is expressed only through its
/// subtasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTask {
    pub id: TaskId,
    pub text: String,
    pub importance: u8,
    pub deadline: Deadline,
    /// Derived from the subtasks; callers never set it directly.
    #[serde(default)]
    pub completed: bool,
    pub created_at_utc: i64,
    #[serde(default)]
    pub completed_at_utc: Option<i64>,
}

impl CategoryTask {
    pub fn new(text: impl Into<String>, importance: u8, deadline: Deadline) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            importance,
            deadline,
            completed: false,
            created_at_utc: Utc::now().timestamp(),
            completed_at_utc: None,
        }
    }
}
