//! The task store and utility functions around it.
//!
//! `Database` owns the active tasks, the categories and the archive and is
//! the only place they are mutated. Every mutating method keeps the store
//! consistent before it returns: classified tasks carry the quadrant of
//! their current fields, every subtask points to an existing category, and
//! each category's completion matches its subtasks.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::classify;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::propagate::reconcile;
use crate::stats::{aggregate, StatsSnapshot};
use crate::storage::{self, KeyValueStore, ARCHIVE_KEY, CATEGORIES_KEY, TASKS_KEY};
use crate::task::{CategoryTask, Task, TaskId};

/// In-memory store for tasks, categories and archived tasks.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Database {
    tasks: Vec<Task>,
    categories: Vec<CategoryTask>,
    archive: Vec<Task>,
}

impl Database {
    /// Load all collections from `store`. Missing or unreadable keys start empty.
    pub fn load_from(store: &impl KeyValueStore) -> Self {
        let mut db = Database {
            tasks: storage::load(store, TASKS_KEY),
            categories: storage::load(store, CATEGORIES_KEY),
            archive: storage::load(store, ARCHIVE_KEY),
        };
        db.repair();
        db
    }

    /// Write all collections to `store`. Returns false if any write failed;
    /// the in-memory state is kept either way.
    pub fn save_to(&self, store: &impl KeyValueStore) -> bool {
        let tasks = storage::save(store, TASKS_KEY, &self.tasks);
        let categories = storage::save(store, CATEGORIES_KEY, &self.categories);
        let archive = storage::save(store, ARCHIVE_KEY, &self.archive);
        tasks && categories && archive
    }

    /// Bring loaded data back in line with the store's rules. Out-of-range
    /// fields are clamped, stale quadrants recomputed, duplicate ids and
    /// subtasks of missing categories dropped, and category completion
    /// re-derived.
    fn repair(&mut self) {
        let mut fixed = 0usize;
        let mut seen = BTreeSet::new();
        self.categories.retain(|c| seen.insert(c.id));
        for c in &mut self.categories {
            let importance = clamp_importance(c.importance);
            if importance != c.importance {
                c.importance = importance;
                fixed += 1;
            }
        }

        let known: BTreeSet<TaskId> = self.categories.iter().map(|c| c.id).collect();
        let before = self.tasks.len();
        let mut seen = BTreeSet::new();
        self.tasks
            .retain(|t| seen.insert(t.id) && t.parent.map_or(true, |p| known.contains(&p)));
        if self.tasks.len() != before {
            warn!(dropped = before - self.tasks.len(), "dropped duplicate or orphaned tasks");
        }

        for task in &mut self.tasks {
            fixed += usize::from(Self::repair_task(task, true));
        }
        // Archived snapshots keep the quadrant they were archived with.
        for task in &mut self.archive {
            fixed += usize::from(Self::repair_task(task, false));
        }
        if fixed > 0 {
            warn!(fixed, "repaired invalid fields in loaded data");
        }

        for id in known {
            self.reconcile_category(id);
        }
    }

    fn repair_task(task: &mut Task, reclassify: bool) -> bool {
        let mut repaired = task.clone();
        repaired.importance = clamp_importance(repaired.importance);
        repaired.estimated = repaired.estimated.normalized();
        repaired.actual = repaired.actual.map(TimeSpan::normalized);
        if reclassify && repaired.quadrant.is_some() {
            repaired.quadrant = Some(classify(repaired.importance, &repaired.deadline));
        }
        Self::settle_completion(&mut repaired);
        if repaired == *task {
            return false;
        }
        *task = repaired;
        true
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[CategoryTask] {
        &self.categories
    }

    pub fn archive(&self) -> &[Task] {
        &self.archive
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a category by ID.
    pub fn get_category(&self, id: TaskId) -> Option<&CategoryTask> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// The live category a task belongs to, if any.
    pub fn parent_of(&self, task_id: TaskId) -> Option<&CategoryTask> {
        self.get_task(task_id)
            .and_then(|t| t.parent)
            .and_then(|p| self.get_category(p))
    }

    /// Subtasks of a category in insertion order.
    pub fn subtasks(&self, category_id: TaskId) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.parent == Some(category_id))
            .collect()
    }

    /// Standalone tasks that have not been prioritised yet.
    pub fn list_inbox_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.is_inbox() && t.parent.is_none())
            .collect()
    }

    /// Categories that still have unprioritised subtasks, paired with those subtasks.
    pub fn list_inbox_categories(&self) -> Vec<(&CategoryTask, Vec<&Task>)> {
        self.categories
            .iter()
            .filter_map(|c| {
                let pending: Vec<&Task> = self
                    .tasks
                    .iter()
                    .filter(|t| t.parent == Some(c.id) && t.is_inbox())
                    .collect();
                (!pending.is_empty()).then_some((c, pending))
            })
            .collect()
    }

    pub fn list_tasks_by_quadrant(&self, quadrant: Quadrant) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.quadrant == Some(quadrant))
            .collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        aggregate(&self.tasks, &self.archive)
    }

    fn position(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound(id))
    }

    fn category_position(&self, id: TaskId) -> Result<usize> {
        self.categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::NotFound(id))
    }

    /// Bring one category's completion in line with its subtasks.
    /// Returns whether the stored state changed.
    pub fn reconcile_category(&mut self, id: TaskId) -> bool {
        let Some(idx) = self.categories.iter().position(|c| c.id == id) else {
            return false;
        };
        match reconcile(&self.tasks, &self.categories[idx]) {
            Some(update) => {
                update.apply(&mut self.categories[idx]);
                debug!(category = %id, completed = update.completed, "category completion changed");
                true
            }
            None => false,
        }
    }

    fn reconcile_parent(&mut self, parent: Option<TaskId>) {
        if let Some(p) = parent {
            self.reconcile_category(p);
        }
    }

    /// Add a new task to the inbox with the capture defaults.
    pub fn capture_task(&mut self, text: impl Into<String>) -> Task {
        let task = Task::new(text);
        debug!(task = %task.id, "captured task");
        self.tasks.push(task.clone());
        task
    }

    /// Add a new, empty category.
    pub fn capture_category(
        &mut self,
        text: impl Into<String>,
        importance: u8,
        deadline: Deadline,
    ) -> Result<CategoryTask> {
        let category = CategoryTask::new(text, validate_importance(importance)?, deadline);
        debug!(category = %category.id, "captured category");
        self.categories.push(category.clone());
        Ok(category)
    }

    /// Add an inbox task under a category, inheriting its importance and deadline.
    pub fn add_subtask(&mut self, category_id: TaskId, text: impl Into<String>) -> Result<Task> {
        let idx = self.category_position(category_id)?;
        let task = Task::new_subtask(&self.categories[idx], text);
        debug!(task = %task.id, category = %category_id, "added subtask");
        self.tasks.push(task.clone());
        self.reconcile_category(category_id);
        Ok(task)
    }

    /// Insert or replace a task and place it on the matrix.
    ///
    /// This is the only operation that takes a task out of the inbox. The
    /// stored quadrant is always recomputed from importance and deadline.
    pub fn prioritize_task(&mut self, task: Task) -> Result<Task> {
        let mut task = Self::checked(task)?;
        if let Some(parent) = task.parent {
            self.category_position(parent)?;
        }
        task.quadrant = Some(classify(task.importance, &task.deadline));

        let old_parent = match self.tasks.iter().position(|t| t.id == task.id) {
            Some(idx) => std::mem::replace(&mut self.tasks[idx], task.clone()).parent,
            None => {
                self.tasks.push(task.clone());
                None
            }
        };
        debug!(task = %task.id, quadrant = ?task.quadrant, "prioritized task");

        self.reconcile_parent(old_parent);
        if task.parent != old_parent {
            self.reconcile_parent(task.parent);
        }
        Ok(task)
    }

    /// Insert or replace a category together with its full subtask list.
    ///
    /// Existing subtasks of the category that are not in `subtasks` leave
    /// the active set. Subtasks still in the inbox stay there; classified
    /// ones get their quadrant recomputed. When `original_task_id` is given
    /// the standalone task that was converted into this category is removed.
    pub fn prioritize_category(
        &mut self,
        category: CategoryTask,
        subtasks: Vec<Task>,
        original_task_id: Option<TaskId>,
    ) -> Result<()> {
        validate_importance(category.importance)?;
        if let Some(original) = original_task_id {
            self.position(original)?;
        }
        let subtasks = subtasks
            .into_iter()
            .map(|mut t| {
                t.parent = Some(category.id);
                if t.quadrant.is_some() {
                    t.quadrant = Some(classify(t.importance, &t.deadline));
                }
                Self::checked(t)
            })
            .collect::<Result<Vec<_>>>()?;
        let incoming: BTreeSet<TaskId> = subtasks.iter().map(|t| t.id).collect();
        if incoming.len() != subtasks.len() {
            return Err(Error::InvalidRange("subtask list repeats a task id".into()));
        }

        let category_id = category.id;
        match self.categories.iter().position(|c| c.id == category_id) {
            Some(idx) => {
                let stored = &mut self.categories[idx];
                stored.text = category.text;
                stored.importance = category.importance;
                stored.deadline = category.deadline;
            }
            None => self.categories.push(CategoryTask {
                completed: false,
                completed_at_utc: None,
                ..category
            }),
        }

        let mut touched: BTreeSet<TaskId> = BTreeSet::new();
        self.tasks.retain(|t| {
            let drop = t.parent == Some(category_id)
                || Some(t.id) == original_task_id
                || incoming.contains(&t.id);
            if drop {
                touched.extend(t.parent);
            }
            !drop
        });
        self.tasks.extend(subtasks);
        debug!(category = %category_id, subtasks = incoming.len(), "prioritized category");

        touched.insert(category_id);
        for id in touched {
            self.reconcile_category(id);
        }
        Ok(())
    }

    /// Remove a single task. Sibling subtasks are left alone.
    pub fn delete_task(&mut self, id: TaskId) -> Result<()> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        debug!(task = %id, "deleted task");
        self.reconcile_parent(removed.parent);
        Ok(())
    }

    /// Remove a category and every subtask that belongs to it.
    pub fn delete_category(&mut self, id: TaskId) -> Result<()> {
        let idx = self.category_position(id)?;
        self.categories.remove(idx);
        let before = self.tasks.len();
        self.tasks.retain(|t| t.parent != Some(id));
        debug!(category = %id, subtasks = before - self.tasks.len(), "deleted category");
        Ok(())
    }

    /// Flip a task's completion and re-derive its category.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<()> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.completed = !task.completed;
        if task.completed {
            task.completed_at_utc = Some(Utc::now().timestamp());
        } else {
            task.completed_at_utc = None;
            task.actual = None;
        }
        debug!(task = %id, completed = task.completed, "toggled completion");
        let parent = task.parent;
        self.reconcile_parent(parent);
        Ok(())
    }

    /// Complete a task and record how long it actually took.
    pub fn complete_with_time(&mut self, id: TaskId, actual: TimeSpan) -> Result<()> {
        let actual = actual.validate()?;
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.completed = true;
        task.completed_at_utc = Some(Utc::now().timestamp());
        task.actual = Some(actual);
        debug!(task = %id, actual = %actual, "completed with recorded time");
        let parent = task.parent;
        self.reconcile_parent(parent);
        Ok(())
    }

    /// Move a completed task from the active set to the archive.
    pub fn archive_task(&mut self, id: TaskId) -> Result<()> {
        let idx = self.position(id)?;
        if !self.tasks[idx].completed {
            return Err(Error::NotCompleted(id));
        }
        let task = self.tasks.remove(idx);
        debug!(task = %id, "archived task");
        let parent = task.parent;
        self.archive.push(task);
        self.reconcile_parent(parent);
        Ok(())
    }

    /// Validate the ranges of a task about to be stored and settle its
    /// completion fields.
    fn checked(mut task: Task) -> Result<Task> {
        validate_importance(task.importance)?;
        task.estimated = task.estimated.validate()?;
        if let Some(actual) = task.actual {
            task.actual = Some(actual.validate()?);
        }
        Self::settle_completion(&mut task);
        Ok(task)
    }

    /// A completed task always has a completion time; an open one has
    /// neither a completion time nor a recorded actual.
    fn settle_completion(task: &mut Task) {
        if !task.completed {
            task.completed_at_utc = None;
            task.actual = None;
        } else if task.completed_at_utc.is_none() {
            task.completed_at_utc = Some(Utc::now().timestamp());
        }
    }
}

/// Parse human-readable deadline input.
///
/// Supports:
/// - "today", "tomorrow", "none"
/// - "yesterday", "in 3d", "in 2w"
/// - weekday names, optionally prefixed with "this" or "next"
/// - "end of week", "end of month"
/// - "YYYY-MM-DD" format
pub fn parse_deadline_input(s: &str) -> Option<Deadline> {
    parse_deadline_input_on(s, Local::now().date_naive())
}

pub fn parse_deadline_input_on(s: &str, today: NaiveDate) -> Option<Deadline> {
    let s = s.trim().to_lowercase();
    let date = |d: NaiveDate| Some(Deadline::SpecificDate(Some(d)));
    // Out-of-range offsets yield None instead of overflowing the date.
    let shift = |offset: Option<Duration>| {
        offset
            .and_then(|d| today.checked_add_signed(d))
            .map(|d| Deadline::SpecificDate(Some(d)))
    };

    match s.as_str() {
        "today" => return Some(Deadline::Today),
        "tomorrow" => return Some(Deadline::Tomorrow),
        "none" | "no-deadline" | "-" => return Some(Deadline::NoDeadline),
        "yesterday" => return shift(Duration::try_days(-1)),
        "end of week" | "eow" => return date(start_end_of_this_week(today).1),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return date(first_of_next.pred_opt()?);
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return shift(Duration::try_days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return shift(Duration::try_weeks(weeks));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return shift(Duration::try_days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return shift(Duration::try_days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok().map(|d| Deadline::SpecificDate(Some(d)))
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a deadline relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_deadline_relative(deadline: &Deadline, today: NaiveDate) -> String {
    match deadline {
        Deadline::Today => "today".into(),
        Deadline::Tomorrow => "tomorrow".into(),
        Deadline::NoDeadline | Deadline::SpecificDate(None) => "-".into(),
        Deadline::SpecificDate(Some(d)) => {
            let days = (*d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Format an optional quadrant for display.
pub fn format_quadrant(q: Option<Quadrant>) -> &'static str {
    match q {
        Some(Quadrant::Q1) => "Q1",
        Some(Quadrant::Q2) => "Q2",
        Some(Quadrant::Q3) => "Q3",
        Some(Quadrant::Q4) => "Q4",
        None => "inbox",
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], db: &Database) {
    println!(
        "{:<9} {:<6} {:<5} {:<9} {:<10} {:<14} {}",
        "ID", "Done", "Quad", "Imp", "Due", "Estimate", "Text [category]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let category = db
            .parent_of(t.id)
            .map(|c| format!(" [{}]", truncate(&c.text, 20)))
            .unwrap_or_default();
        let estimate = match t.actual {
            Some(actual) => format!("{} / {}", t.estimated, actual),
            None => t.estimated.to_string(),
        };
        println!(
            "{:<9} {:<6} {:<5} {:<9} {:<10} {:<14} {}{}",
            short_id(t.id),
            if t.completed { "x" } else { "" },
            format_quadrant(t.quadrant),
            importance_label(t.importance),
            format_deadline_relative(&t.deadline, today),
            estimate,
            t.text,
            category
        );
    }
}

/// The first eight hex digits of an id, enough to address it from the CLI.
pub fn short_id(id: TaskId) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Resolve a task or category identifier to an id. `candidates` yields
/// `(id, text)` pairs.
///
/// A full id wins, then an exact (case-insensitive) text match, then a
/// unique id prefix. Text is tried before prefixes because names such as
/// "add" or "cafe" are also valid hex.
pub fn resolve_identifier<'a>(
    identifier: &str,
    candidates: impl Iterator<Item = (TaskId, &'a str)> + Clone,
) -> std::result::Result<TaskId, String> {
    if let Ok(id) = identifier.parse::<TaskId>() {
        return candidates
            .clone()
            .find(|(c, _)| *c == id)
            .map(|(c, _)| c)
            .ok_or_else(|| format!("No item with ID {id}"));
    }

    let needle = identifier.to_lowercase();
    let by_text: Vec<(TaskId, &str)> = candidates
        .clone()
        .filter(|(_, text)| text.to_lowercase() == needle)
        .collect();
    let matches = if by_text.is_empty() {
        candidates
            .filter(|(id, _)| id.simple().to_string().starts_with(&needle))
            .collect()
    } else {
        by_text
    };

    match matches.len() {
        0 => Err(format!("No item found matching '{identifier}'")),
        1 => Ok(matches[0].0),
        _ => {
            let mut error_msg = format!("Multiple items match '{identifier}':\n");
            for (id, text) in matches {
                error_msg.push_str(&format!("  {}: {}\n", short_id(id), text));
            }
            error_msg.push_str("Please use the ID or a longer ID prefix instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        // A Friday.
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn errands(db: &mut Database) -> (CategoryTask, Task, Task) {
        let c = db
            .capture_category("Errands", 1, Deadline::NoDeadline)
            .unwrap();
        let milk = db.add_subtask(c.id, "Buy milk").unwrap();
        let letter = db.add_subtask(c.id, "Post letter").unwrap();
        (c, milk, letter)
    }

    #[test]
    fn test_capture_lands_in_inbox() {
        let mut db = Database::default();
        let t = db.capture_task("Write report");
        assert_eq!(db.list_inbox_tasks().len(), 1);
        assert_eq!(db.get_task(t.id).unwrap().quadrant, None);
        for q in Quadrant::ALL {
            assert!(db.list_tasks_by_quadrant(q).is_empty());
        }
    }

    #[test]
    fn test_prioritize_classifies_and_is_idempotent() {
        let mut db = Database::default();
        let mut t = db.capture_task("Write report");
        t.importance = 3;
        let first = db.prioritize_task(t.clone()).unwrap();
        assert_eq!(first.quadrant, Some(Quadrant::Q1));
        let second = db.prioritize_task(t).unwrap();
        assert_eq!(first, second);
        assert_eq!(db.tasks().len(), 1);
        assert!(db.list_inbox_tasks().is_empty());
        assert_eq!(db.list_tasks_by_quadrant(Quadrant::Q1).len(), 1);
    }

    #[test]
    fn test_prioritize_recomputes_stale_quadrant() {
        let mut db = Database::default();
        let mut t = Task::new("Plan trip");
        t.importance = 4;
        t.deadline = Deadline::NoDeadline;
        t.quadrant = Some(Quadrant::Q4);
        let stored = db.prioritize_task(t).unwrap();
        assert_eq!(stored.quadrant, Some(Quadrant::Q2));
    }

    #[test]
    fn test_prioritize_rejects_out_of_range() {
        let mut db = Database::default();
        let mut t = db.capture_task("x");
        t.importance = 5;
        assert!(matches!(db.prioritize_task(t.clone()), Err(Error::InvalidRange(_))));
        t.importance = 0;
        assert!(matches!(db.prioritize_task(t), Err(Error::InvalidRange(_))));
        assert!(db.list_inbox_tasks()[0].quadrant.is_none());
    }

    #[test]
    fn test_prioritize_rejects_unknown_parent() {
        let mut db = Database::default();
        let mut t = Task::new("orphan");
        t.parent = Some(TaskId::new_v4());
        assert!(matches!(db.prioritize_task(t), Err(Error::NotFound(_))));
        assert!(db.tasks().is_empty());
    }

    #[test]
    fn test_category_completion_follows_subtasks() {
        let mut db = Database::default();
        let (c, milk, letter) = errands(&mut db);
        assert_eq!(db.subtasks(c.id).len(), 2);

        db.toggle_complete(milk.id).unwrap();
        assert!(!db.get_category(c.id).unwrap().completed);

        db.toggle_complete(letter.id).unwrap();
        let cat = db.get_category(c.id).unwrap();
        assert!(cat.completed);
        assert!(cat.completed_at_utc.is_some());

        db.toggle_complete(milk.id).unwrap();
        let cat = db.get_category(c.id).unwrap();
        assert!(!cat.completed);
        assert_eq!(cat.completed_at_utc, None);
    }

    #[test]
    fn test_new_subtask_reopens_completed_category() {
        let mut db = Database::default();
        let (c, milk, letter) = errands(&mut db);
        db.toggle_complete(milk.id).unwrap();
        db.toggle_complete(letter.id).unwrap();
        assert!(db.get_category(c.id).unwrap().completed);
        db.add_subtask(c.id, "Return books").unwrap();
        assert!(!db.get_category(c.id).unwrap().completed);
    }

    #[test]
    fn test_empty_category_is_never_complete() {
        let mut db = Database::default();
        let (c, milk, letter) = errands(&mut db);
        db.toggle_complete(milk.id).unwrap();
        db.toggle_complete(letter.id).unwrap();
        db.delete_task(milk.id).unwrap();
        assert!(db.get_category(c.id).unwrap().completed);
        db.delete_task(letter.id).unwrap();
        assert!(!db.get_category(c.id).unwrap().completed);
    }

    #[test]
    fn test_delete_task_leaves_siblings() {
        let mut db = Database::default();
        let (c, milk, letter) = errands(&mut db);
        db.delete_task(milk.id).unwrap();
        let left: Vec<TaskId> = db.subtasks(c.id).iter().map(|t| t.id).collect();
        assert_eq!(left, vec![letter.id]);
    }

    #[test]
    fn test_delete_category_cascades() {
        let mut db = Database::default();
        let (c, _, _) = errands(&mut db);
        let keep = db.capture_task("standalone");
        db.delete_category(c.id).unwrap();
        assert!(db.get_category(c.id).is_none());
        assert_eq!(db.tasks().len(), 1);
        assert_eq!(db.tasks()[0].id, keep.id);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut db = Database::default();
        let id = TaskId::new_v4();
        assert_eq!(db.toggle_complete(id), Err(Error::NotFound(id)));
        assert_eq!(db.delete_task(id), Err(Error::NotFound(id)));
        assert_eq!(db.delete_category(id), Err(Error::NotFound(id)));
        assert_eq!(db.archive_task(id), Err(Error::NotFound(id)));
        assert_eq!(
            db.complete_with_time(id, TimeSpan::new(0, 10).unwrap()),
            Err(Error::NotFound(id))
        );
        assert!(matches!(db.add_subtask(id, "x"), Err(Error::NotFound(_))));
        assert!(db.archive().is_empty());
    }

    #[test]
    fn test_uncompleting_clears_recorded_time() {
        let mut db = Database::default();
        let t = db.capture_task("focus");
        db.complete_with_time(t.id, TimeSpan::new(1, 5).unwrap()).unwrap();
        let stored = db.get_task(t.id).unwrap();
        assert!(stored.completed);
        assert_eq!(stored.actual, Some(TimeSpan::new(1, 5).unwrap()));
        db.toggle_complete(t.id).unwrap();
        let stored = db.get_task(t.id).unwrap();
        assert!(!stored.completed);
        assert_eq!(stored.completed_at_utc, None);
        assert_eq!(stored.actual, None);
    }

    #[test]
    fn test_complete_with_time_propagates() {
        let mut db = Database::default();
        let (c, milk, letter) = errands(&mut db);
        db.complete_with_time(milk.id, TimeSpan::new(0, 20).unwrap()).unwrap();
        db.complete_with_time(letter.id, TimeSpan::new(0, 5).unwrap()).unwrap();
        assert!(db.get_category(c.id).unwrap().completed);
    }

    #[test]
    fn test_archive_requires_completion() {
        let mut db = Database::default();
        let t = db.capture_task("draft");
        assert_eq!(db.archive_task(t.id), Err(Error::NotCompleted(t.id)));
        db.toggle_complete(t.id).unwrap();
        db.archive_task(t.id).unwrap();
        assert!(db.get_task(t.id).is_none());
        assert_eq!(db.archive().len(), 1);
    }

    #[test]
    fn test_prioritize_category_replaces_subtasks() {
        let mut db = Database::default();
        let (mut c, milk, letter) = errands(&mut db);
        c.text = "Weekend errands".into();
        let mut kept = letter.clone();
        kept.quadrant = Some(Quadrant::Q1);
        let fresh = Task::new_subtask(&c, "Car wash");

        db.prioritize_category(c.clone(), vec![kept, fresh.clone()], None)
            .unwrap();

        assert_eq!(db.get_category(c.id).unwrap().text, "Weekend errands");
        assert!(db.get_task(milk.id).is_none());
        let subs = db.subtasks(c.id);
        assert_eq!(subs.len(), 2);
        // importance 1, no deadline: recomputed rather than trusted
        assert_eq!(db.get_task(letter.id).unwrap().quadrant, Some(Quadrant::Q4));
        assert_eq!(db.get_task(fresh.id).unwrap().quadrant, None);
        assert_eq!(db.list_inbox_categories().len(), 1);
    }

    #[test]
    fn test_prioritize_category_converts_task() {
        let mut db = Database::default();
        let original = db.capture_task("Move house");
        let c = CategoryTask::new("Move house", 4, Deadline::Tomorrow);
        let subs = vec![
            Task::new_subtask(&c, "Book van"),
            Task::new_subtask(&c, "Pack kitchen"),
        ];
        db.prioritize_category(c.clone(), subs, Some(original.id))
            .unwrap();

        assert!(db.get_task(original.id).is_none());
        assert!(db.list_inbox_tasks().is_empty());
        let inbox = db.list_inbox_categories();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].0.id, c.id);
        assert_eq!(inbox[0].1.len(), 2);
        assert!(db.subtasks(c.id).iter().all(|t| t.quadrant.is_none()));
    }

    #[test]
    fn test_prioritize_category_ignores_caller_completion() {
        let mut db = Database::default();
        let mut c = CategoryTask::new("Empty", 2, Deadline::Today);
        c.completed = true;
        c.completed_at_utc = Some(1);
        db.prioritize_category(c.clone(), Vec::new(), None).unwrap();
        assert!(!db.get_category(c.id).unwrap().completed);
    }

    #[test]
    fn test_prioritize_category_unknown_original_fails_cleanly() {
        let mut db = Database::default();
        let c = CategoryTask::new("Nope", 2, Deadline::Today);
        let missing = TaskId::new_v4();
        assert_eq!(
            db.prioritize_category(c.clone(), Vec::new(), Some(missing)),
            Err(Error::NotFound(missing))
        );
        assert!(db.get_category(c.id).is_none());
    }

    #[test]
    fn test_parent_of_is_live() {
        let mut db = Database::default();
        let (mut c, milk, _) = errands(&mut db);
        c.text = "Renamed".into();
        let subs: Vec<Task> = db.subtasks(c.id).into_iter().cloned().collect();
        db.prioritize_category(c.clone(), subs, None).unwrap();
        assert_eq!(db.parent_of(milk.id).unwrap().text, "Renamed");
    }

    #[test]
    fn test_repair_on_load() {
        let store = crate::storage::MemoryStore::new();
        let mut db = Database::default();
        let (c, milk, letter) = errands(&mut db);
        db.toggle_complete(milk.id).unwrap();
        db.toggle_complete(letter.id).unwrap();
        let mut orphan = Task::new("orphan");
        orphan.parent = Some(TaskId::new_v4());
        db.tasks.push(orphan);
        db.categories[0].completed = false;
        assert!(db.save_to(&store));

        let loaded = Database::load_from(&store);
        assert_eq!(loaded.tasks().len(), 2);
        assert!(loaded.get_category(c.id).unwrap().completed);
    }

    #[test]
    fn test_repair_fixes_ranges_and_stale_quadrants() {
        let store = crate::storage::MemoryStore::new();
        let mut db = Database::default();
        let mut report = db.capture_task("Write report");
        report.importance = 3;
        let report = db.prioritize_task(report).unwrap();
        let (c, _, _) = errands(&mut db);

        let raw = &mut db.tasks[0];
        raw.importance = 9;
        raw.quadrant = Some(Quadrant::Q4);
        raw.estimated = serde_json::from_str(r#"{"hours":0,"minutes":95}"#).unwrap();
        raw.completed = true;
        db.categories[0].importance = 0;
        assert!(db.save_to(&store));

        let loaded = Database::load_from(&store);
        let task = loaded.get_task(report.id).unwrap();
        assert_eq!(task.importance, 4);
        assert_eq!(task.estimated, TimeSpan::new(1, 35).unwrap());
        assert_eq!(task.quadrant, Some(Quadrant::Q1));
        assert!(task.completed_at_utc.is_some());
        assert_eq!(loaded.get_category(c.id).unwrap().importance, 1);
        assert!(loaded.subtasks(c.id).iter().all(|t| t.quadrant.is_none()));
    }

    #[test]
    fn test_repair_drops_duplicate_ids() {
        let store = crate::storage::MemoryStore::new();
        let mut db = Database::default();
        let t = db.capture_task("twice");
        let duplicate = db.tasks[0].clone();
        db.tasks.push(duplicate);
        assert!(db.save_to(&store));

        let loaded = Database::load_from(&store);
        assert_eq!(loaded.tasks().len(), 1);
        assert_eq!(loaded.tasks()[0].id, t.id);
    }

    #[test]
    fn test_prioritize_category_rejects_repeated_subtask() {
        let mut db = Database::default();
        let (c, milk, _) = errands(&mut db);
        let result = db.prioritize_category(c.clone(), vec![milk.clone(), milk.clone()], None);
        assert!(matches!(result, Err(Error::InvalidRange(_))));
        assert_eq!(db.subtasks(c.id).len(), 2);
        assert_eq!(db.tasks().iter().filter(|t| t.id == milk.id).count(), 1);
    }

    #[test]
    fn test_prioritize_stamps_missing_completion_time() {
        let mut db = Database::default();
        let mut t = Task::new("done elsewhere");
        t.completed = true;
        let stored = db.prioritize_task(t).unwrap();
        assert!(stored.completed);
        assert!(stored.completed_at_utc.is_some());
        assert_eq!(db.get_task(stored.id).unwrap(), &stored);
    }

    #[test]
    fn test_parse_deadline_input() {
        let today = day();
        assert_eq!(parse_deadline_input_on("Today", today), Some(Deadline::Today));
        assert_eq!(parse_deadline_input_on("tomorrow", today), Some(Deadline::Tomorrow));
        assert_eq!(parse_deadline_input_on("none", today), Some(Deadline::NoDeadline));
        assert_eq!(
            parse_deadline_input_on("in 3d", today),
            Some(Deadline::SpecificDate(NaiveDate::from_ymd_opt(2024, 3, 18)))
        );
        assert_eq!(
            parse_deadline_input_on("next monday", today),
            Some(Deadline::SpecificDate(NaiveDate::from_ymd_opt(2024, 3, 25)))
        );
        assert_eq!(
            parse_deadline_input_on("fri", today),
            Some(Deadline::SpecificDate(Some(today)))
        );
        assert_eq!(
            parse_deadline_input_on("eom", today),
            Some(Deadline::SpecificDate(NaiveDate::from_ymd_opt(2024, 3, 31)))
        );
        assert_eq!(
            parse_deadline_input_on("2024-12-01", today),
            Some(Deadline::SpecificDate(NaiveDate::from_ymd_opt(2024, 12, 1)))
        );
        assert_eq!(parse_deadline_input_on("someday", today), None);
    }

    #[test]
    fn test_parse_deadline_input_out_of_range_offsets() {
        let today = day();
        assert_eq!(parse_deadline_input_on("in 999999999999d", today), None);
        assert_eq!(parse_deadline_input_on("in -999999999999d", today), None);
        assert_eq!(parse_deadline_input_on("in 99999999999w", today), None);
        assert_eq!(
            parse_deadline_input_on("yesterday", today),
            Some(Deadline::SpecificDate(NaiveDate::from_ymd_opt(2024, 3, 14)))
        );
    }

    #[test]
    fn test_format_deadline_relative() {
        let today = day();
        let on = |n| Deadline::SpecificDate(Some(today + Duration::days(n)));
        assert_eq!(format_deadline_relative(&on(0), today), "today");
        assert_eq!(format_deadline_relative(&on(4), today), "in 4d");
        assert_eq!(format_deadline_relative(&on(-2), today), "2d late");
        assert_eq!(format_deadline_relative(&Deadline::NoDeadline, today), "-");
    }

    #[test]
    fn test_resolve_identifier() {
        let a = TaskId::new_v4();
        let b = TaskId::new_v4();
        let items = vec![(a, "Buy milk".to_string()), (b, "Post letter".to_string())];
        let iter = || items.iter().map(|(id, t)| (*id, t.as_str()));
        assert_eq!(resolve_identifier(&a.to_string(), iter()), Ok(a));
        assert_eq!(resolve_identifier(&short_id(b), iter()), Ok(b));
        assert_eq!(resolve_identifier("buy milk", iter()), Ok(a));
        assert!(resolve_identifier("groceries", iter()).is_err());
    }

    #[test]
    fn test_resolve_identifier_prefers_text_over_hex_prefix() {
        let named_add = TaskId::parse_str("11111111-1111-4111-8111-111111111111").unwrap();
        let hex_add = TaskId::parse_str("add00000-0000-4000-8000-000000000002").unwrap();
        let items = [(named_add, "add"), (hex_add, "Buy milk")];
        assert_eq!(resolve_identifier("add", items.iter().copied()), Ok(named_add));
        assert_eq!(resolve_identifier("ADD", items.iter().copied()), Ok(named_add));
        assert_eq!(resolve_identifier("add0", items.iter().copied()), Ok(hex_add));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer label", 6), "a muc…");
    }
}
