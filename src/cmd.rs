//! Command implementations for the CLI interface.
//!
//! Each handler resolves its arguments against the loaded `Database`,
//! performs exactly one store operation and writes the collections back.
//! None of them contain prioritisation logic of their own.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use daily_focus::db::*;
use daily_focus::fields::*;
use daily_focus::storage::KeyValueStore;
use daily_focus::{Accuracy, CategoryTask, Database, Error, Task, TaskId};

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a task into the inbox.
    Capture {
        /// Task text.
        text: String,
    },

    /// Create an empty category.
    Category {
        /// Category text.
        text: String,
        /// Importance 1-4 (low, medium, high, critical).
        #[arg(long, default_value_t = 2)]
        importance: u8,
        /// Deadline: "today", "tomorrow", "none", "in Nd" or YYYY-MM-DD.
        #[arg(long, default_value = "today")]
        due: String,
    },

    /// Add a subtask to a category.
    Subtask {
        /// Category ID prefix or text.
        category: String,
        /// Subtask text.
        text: String,
    },

    /// Prioritise or edit a task, placing it on the matrix.
    Prioritize {
        /// Task ID prefix or text.
        id: String,
        #[arg(long)]
        text: Option<String>,
        /// Importance 1-4.
        #[arg(long)]
        importance: Option<u8>,
        /// Deadline: "today", "tomorrow", "none", "in Nd" or YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        /// Estimated hours.
        #[arg(long)]
        hours: Option<u32>,
        /// Estimated minutes (0-59).
        #[arg(long)]
        minutes: Option<u8>,
    },

    /// Turn a standalone task into a category with the given subtasks.
    Convert {
        /// Task ID prefix or text.
        id: String,
        /// Importance 1-4.
        #[arg(long)]
        importance: Option<u8>,
        #[arg(long)]
        due: Option<String>,
        /// Subtask text. May be repeated.
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },

    /// Edit a category's text, importance or deadline, keeping its subtasks.
    EditCategory {
        /// Category ID prefix or text.
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        importance: Option<u8>,
        #[arg(long)]
        due: Option<String>,
    },

    /// Show unprioritised tasks and categories.
    Inbox,

    /// List prioritised tasks by quadrant.
    List {
        /// Only this quadrant.
        #[arg(long, value_enum)]
        quadrant: Option<Quadrant>,
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
    },

    /// Toggle a task's completion.
    Toggle {
        /// Task ID prefix or text.
        id: String,
    },

    /// Complete a task, recording the time it actually took.
    Complete {
        /// Task ID prefix or text.
        id: String,
        #[arg(long, default_value_t = 0)]
        hours: u32,
        #[arg(long, default_value_t = 0)]
        minutes: u8,
        /// Stopwatch reading in seconds, used instead of --hours/--minutes.
        #[arg(long, conflicts_with_all = ["hours", "minutes"])]
        elapsed_secs: Option<u64>,
    },

    /// Move a completed task to the archive.
    Archive {
        /// Task ID prefix or text.
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID prefix or text.
        id: String,
    },

    /// Delete a category and all of its subtasks.
    DeleteCategory {
        /// Category ID prefix or text.
        id: String,
    },

    /// Show completion and time-estimate statistics.
    Stats {
        /// List archived tasks as well.
        #[arg(long)]
        archive: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Exit with a message when a store operation fails.
fn check<T>(result: Result<T, Error>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    })
}

/// Persist after a mutation. A failed write is reported but the command still succeeds.
fn persist(db: &Database, store: &impl KeyValueStore) {
    if !db.save_to(store) {
        eprintln!("Warning: changes could not be saved; they will be lost when this session ends.");
    }
}

fn resolve_task(db: &Database, identifier: &str) -> TaskId {
    let candidates = db.tasks().iter().map(|t| (t.id, t.text.as_str()));
    resolve_identifier(identifier, candidates).unwrap_or_else(|e| {
        eprintln!("Error resolving task: {e}");
        std::process::exit(1);
    })
}

fn resolve_category(db: &Database, identifier: &str) -> TaskId {
    let candidates = db.categories().iter().map(|c| (c.id, c.text.as_str()));
    resolve_identifier(identifier, candidates).unwrap_or_else(|e| {
        eprintln!("Error resolving category: {e}");
        std::process::exit(1);
    })
}

fn parse_deadline(s: &str) -> Deadline {
    parse_deadline_input(s).unwrap_or_else(|| {
        eprintln!("Unrecognised deadline '{s}'. Use today, tomorrow, none, in Nd or YYYY-MM-DD.");
        std::process::exit(1);
    })
}

/// Capture a new inbox task.
pub fn cmd_capture(db: &mut Database, store: &impl KeyValueStore, text: String) {
    let task = db.capture_task(text);
    persist(db, store);
    println!("Captured {}", short_id(task.id));
}

/// Create an empty category.
pub fn cmd_category(
    db: &mut Database,
    store: &impl KeyValueStore,
    text: String,
    importance: u8,
    due: String,
) {
    let category = check(db.capture_category(text, importance, parse_deadline(&due)));
    persist(db, store);
    println!("Created category {}", short_id(category.id));
}

/// Add a subtask to an existing category.
pub fn cmd_subtask(db: &mut Database, store: &impl KeyValueStore, category: String, text: String) {
    let category_id = resolve_category(db, &category);
    let task = check(db.add_subtask(category_id, text));
    persist(db, store);
    println!("Added subtask {}", short_id(task.id));
}

/// Apply field overrides to a task and prioritise it.
pub fn cmd_prioritize(
    db: &mut Database,
    store: &impl KeyValueStore,
    id: String,
    text: Option<String>,
    importance: Option<u8>,
    due: Option<String>,
    hours: Option<u32>,
    minutes: Option<u8>,
) {
    let task_id = resolve_task(db, &id);
    let Some(mut task) = db.get_task(task_id).cloned() else {
        eprintln!("Task {} not found.", short_id(task_id));
        std::process::exit(1);
    };
    if let Some(text) = text {
        task.text = text;
    }
    if let Some(importance) = importance {
        task.importance = importance;
    }
    if let Some(due) = due {
        task.deadline = parse_deadline(&due);
    }
    if hours.is_some() || minutes.is_some() {
        task.estimated = check(TimeSpan::new(
            hours.unwrap_or(task.estimated.hours()),
            minutes.unwrap_or(task.estimated.minutes()),
        ));
    }
    let task = check(db.prioritize_task(task));
    persist(db, store);
    let quadrant = task.quadrant.unwrap_or(Quadrant::Q4);
    println!(
        "{} -> {} ({}: {})",
        short_id(task.id),
        format_quadrant(task.quadrant),
        quadrant.title(),
        quadrant.subtitle()
    );
}

/// Replace a standalone task with a category holding the given subtasks.
pub fn cmd_convert(
    db: &mut Database,
    store: &impl KeyValueStore,
    id: String,
    importance: Option<u8>,
    due: Option<String>,
    subtasks: Vec<String>,
) {
    let task_id = resolve_task(db, &id);
    let Some(original) = db.get_task(task_id).cloned() else {
        eprintln!("Task {} not found.", short_id(task_id));
        std::process::exit(1);
    };
    if original.parent.is_some() {
        eprintln!("Task {} is already a subtask.", short_id(task_id));
        std::process::exit(1);
    }
    let deadline = due.as_deref().map(parse_deadline).unwrap_or(original.deadline);
    let category = CategoryTask::new(
        original.text.clone(),
        importance.unwrap_or(original.importance),
        deadline,
    );
    let subtasks: Vec<Task> = subtasks
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| Task::new_subtask(&category, s))
        .collect();
    let category_id = category.id;
    check(db.prioritize_category(category, subtasks, Some(task_id)));
    persist(db, store);
    println!("Converted {} into category {}", short_id(task_id), short_id(category_id));
}

/// Edit a category in place, keeping its subtask list.
pub fn cmd_edit_category(
    db: &mut Database,
    store: &impl KeyValueStore,
    id: String,
    text: Option<String>,
    importance: Option<u8>,
    due: Option<String>,
) {
    let category_id = resolve_category(db, &id);
    let Some(mut category) = db.get_category(category_id).cloned() else {
        eprintln!("Category {} not found.", short_id(category_id));
        std::process::exit(1);
    };
    if let Some(text) = text {
        category.text = text;
    }
    if let Some(importance) = importance {
        category.importance = importance;
    }
    if let Some(due) = due {
        category.deadline = parse_deadline(&due);
    }
    let subtasks: Vec<Task> = db.subtasks(category_id).into_iter().cloned().collect();
    check(db.prioritize_category(category, subtasks, None));
    persist(db, store);
    println!("Updated category {}", short_id(category_id));
}

/// Print the inbox: standalone tasks first, then categories with pending subtasks.
pub fn cmd_inbox(db: &Database) {
    let tasks = db.list_inbox_tasks();
    let categories = db.list_inbox_categories();
    if tasks.is_empty() && categories.is_empty() {
        println!("Inbox is empty.");
        return;
    }
    if !tasks.is_empty() {
        print_table(&tasks, db);
    }
    for (category, pending) in categories {
        println!();
        println!(
            "{} {} ({})",
            short_id(category.id),
            category.text,
            pending.len()
        );
        print_table(&pending, db);
    }
}

/// List prioritised tasks grouped by quadrant.
pub fn cmd_list(db: &Database, quadrant: Option<Quadrant>, all: bool) {
    let quadrants: Vec<Quadrant> = match quadrant {
        Some(q) => vec![q],
        None => Quadrant::ALL.to_vec(),
    };
    for (i, q) in quadrants.into_iter().enumerate() {
        let tasks: Vec<&Task> = db
            .list_tasks_by_quadrant(q)
            .into_iter()
            .filter(|t| all || !t.completed)
            .collect();
        if i > 0 {
            println!();
        }
        println!("{} {} - {}", format_quadrant(Some(q)), q.title(), q.subtitle());
        if tasks.is_empty() {
            println!("  (no tasks)");
        } else {
            print_table(&tasks, db);
        }
    }
}

/// Toggle completion and report the category if it changed state.
pub fn cmd_toggle(db: &mut Database, store: &impl KeyValueStore, id: String) {
    let task_id = resolve_task(db, &id);
    check(db.toggle_complete(task_id));
    persist(db, store);
    report_completion(db, task_id);
}

/// Complete with a recorded actual time.
pub fn cmd_complete(
    db: &mut Database,
    store: &impl KeyValueStore,
    id: String,
    hours: u32,
    minutes: u8,
    elapsed_secs: Option<u64>,
) {
    let task_id = resolve_task(db, &id);
    let actual = match elapsed_secs {
        Some(secs) => TimeSpan::from_elapsed_secs(secs),
        None => check(TimeSpan::new(hours, minutes)),
    };
    check(db.complete_with_time(task_id, actual));
    persist(db, store);
    report_completion(db, task_id);
}

fn report_completion(db: &Database, task_id: TaskId) {
    let Some(task) = db.get_task(task_id) else {
        return;
    };
    let state = if task.completed { "Completed" } else { "Reopened" };
    println!("{state} {}", short_id(task_id));
    if let Some(category) = db.parent_of(task_id) {
        if category.completed {
            println!("Category '{}' is complete.", category.text);
        }
    }
}

pub fn cmd_archive(db: &mut Database, store: &impl KeyValueStore, id: String) {
    let task_id = resolve_task(db, &id);
    check(db.archive_task(task_id));
    persist(db, store);
    println!("Archived {}", short_id(task_id));
}

pub fn cmd_delete(db: &mut Database, store: &impl KeyValueStore, id: String) {
    let task_id = resolve_task(db, &id);
    check(db.delete_task(task_id));
    persist(db, store);
    println!("Deleted.");
}

pub fn cmd_delete_category(db: &mut Database, store: &impl KeyValueStore, id: String) {
    let category_id = resolve_category(db, &id);
    let count = db.subtasks(category_id).len();
    check(db.delete_category(category_id));
    persist(db, store);
    println!("Deleted category and {count} subtask(s).");
}

/// Print the statistics snapshot.
pub fn cmd_stats(db: &Database, show_archive: bool) {
    let stats = db.stats();
    let accuracy = match stats.accuracy() {
        Accuracy::NoData => "no recorded times yet",
        Accuracy::Accurate => "spot on",
        Accuracy::OverEstimated => "finished faster than estimated",
        Accuracy::UnderEstimated => "took longer than estimated",
    };
    println!("{:<22} {}", "Tasks completed", stats.total_completed);
    println!("{:<22} {}", "Critical tasks (Q1)", stats.q1_completed);
    println!("{:<22} {}", "Estimated time", stats.estimated_total);
    println!("{:<22} {}", "Recorded time", stats.actual_total);
    println!("{:<22} {}% ({accuracy})", "Time accuracy", stats.accuracy_ratio);
    println!("{:<22} {}", "Archived", stats.archived_count);
    if show_archive && !stats.archived.is_empty() {
        println!();
        for t in &stats.archived {
            println!(
                "{:<9} {:<5} {:<14} {}",
                short_id(t.id),
                format_quadrant(t.quadrant),
                t.estimated.to_string(),
                truncate(&t.text, 40)
            );
        }
    }
    if stats.total_completed == 0 {
        println!();
        println!("Complete some tasks to see your stats!");
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
