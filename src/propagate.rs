//! Derivation of a category's completion state from its subtasks.

use chrono::Utc;

use crate::task::{CategoryTask, Task};

/// New completion state for a category whose stored state is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub completed: bool,
    pub completed_at_utc: Option<i64>,
}

/// Whether a set of subtasks makes their category complete. An empty set never does.
pub fn all_complete<'a>(subtasks: impl IntoIterator<Item = &'a Task>) -> bool {
    let mut any = false;
    for t in subtasks {
        if !t.completed {
            return false;
        }
        any = true;
    }
    any
}

/// Compare `category` against the subtasks in `tasks` that point to it.
///
/// Returns `None` when the stored state already matches, so callers never
/// rewrite an unchanged `completed_at_utc`.
pub fn reconcile(tasks: &[Task], category: &CategoryTask) -> Option<CategoryUpdate> {
    let completed = all_complete(tasks.iter().filter(|t| t.parent == Some(category.id)));
    if completed == category.completed {
        return None;
    }
    Some(CategoryUpdate {
        completed,
        completed_at_utc: completed.then(|| Utc::now().timestamp()),
    })
}

impl CategoryUpdate {
    pub fn apply(self, category: &mut CategoryTask) {
        category.completed = self.completed;
        category.completed_at_utc = self.completed_at_utc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Deadline;

    fn category_with(done: &[bool]) -> (CategoryTask, Vec<Task>) {
        let c = CategoryTask::new("Errands", 1, Deadline::NoDeadline);
        let tasks = done
            .iter()
            .map(|&d| {
                let mut t = Task::new_subtask(&c, "sub");
                t.completed = d;
                t
            })
            .collect();
        (c, tasks)
    }

    #[test]
    fn test_empty_category_never_complete() {
        let (mut c, tasks) = category_with(&[]);
        assert_eq!(reconcile(&tasks, &c), None);
        c.completed = true;
        c.completed_at_utc = Some(1);
        let update = reconcile(&tasks, &c).unwrap();
        assert!(!update.completed);
        assert_eq!(update.completed_at_utc, None);
    }

    #[test]
    fn test_partial_completion_stays_incomplete() {
        let (c, tasks) = category_with(&[true, false]);
        assert_eq!(reconcile(&tasks, &c), None);
    }

    #[test]
    fn test_all_complete_emits_update_once() {
        let (mut c, tasks) = category_with(&[true, true]);
        let update = reconcile(&tasks, &c).unwrap();
        assert!(update.completed);
        assert!(update.completed_at_utc.is_some());
        update.apply(&mut c);
        assert_eq!(reconcile(&tasks, &c), None);
    }

    #[test]
    fn test_ignores_tasks_of_other_categories() {
        let (c, mut tasks) = category_with(&[true]);
        let other = CategoryTask::new("Other", 2, Deadline::Today);
        tasks.push(Task::new_subtask(&other, "pending"));
        tasks.push(Task::new("standalone"));
        assert!(reconcile(&tasks, &c).unwrap().completed);
    }
}
