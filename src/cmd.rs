//! Command implementations for the terminal front end.
//!
//! Each handler resolves its arguments, calls one [`Session`] operation and
//! prints the outcome. Rendering lives here; the engine never prints.

use clap::Subcommand;
use clap_complete::{generate, Shell};
use chrono::Local;

use crate::dates::{days_until_due, format_due_relative, is_overdue_day, local_day, parse_due_input};
use crate::error::{Error, Result};
use crate::fields::{Filter, Priority, SortKey, Theme};
use crate::persist::KeyValueStore;
use crate::session::Session;
use crate::task::Task;
use crate::view::Stats;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Task text.
        text: String,
        /// Priority: low | medium | high.
        #[arg(long, short, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Category (defaults to "General").
        #[arg(long, short)]
        category: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", a weekday, or "in Nd".
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks.
    List {
        /// Status filter, ignored when --search is given.
        #[arg(long, short, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// Sort key.
        #[arg(long, short, value_enum, default_value_t = SortKey::Created)]
        sort: SortKey,
        /// Case-insensitive search over text and category.
        #[arg(long, short = 'q')]
        search: Option<String>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one task in detail.
    Show {
        /// Task id, id prefix, or exact text.
        task: String,
    },

    /// Flip a task between done and not done.
    Toggle {
        /// Task id, id prefix, or exact text.
        task: String,
    },

    /// Replace a task's text.
    Edit {
        /// Task id, id prefix, or exact text.
        task: String,
        /// New text.
        text: String,
    },

    /// Change a task's priority.
    Priority {
        /// Task id, id prefix, or exact text.
        task: String,
        #[arg(value_enum)]
        priority: Priority,
    },

    /// Change a task's category.
    Category {
        /// Task id, id prefix, or exact text.
        task: String,
        category: String,
    },

    /// Set or clear a task's due date.
    Due {
        /// Task id, id prefix, or exact text.
        task: String,
        /// When the task is due.
        #[arg(required_unless_present = "clear")]
        when: Option<String>,
        /// Remove the due date.
        #[arg(long, conflicts_with = "when")]
        clear: bool,
    },

    /// Move a task within the manual order (positions as shown by `list`).
    Move { from: usize, to: usize },

    /// Delete a task.
    Delete {
        /// Task id, id prefix, or exact text.
        task: String,
    },

    /// Delete every completed task.
    ClearCompleted,

    /// Delete every task.
    ClearAll,

    /// Print task counts.
    Stats,

    /// Show or change the display theme.
    Theme {
        /// Switch between light and dark.
        #[arg(long, conflicts_with = "set")]
        toggle: bool,
        /// Set a specific theme.
        #[arg(long, value_enum)]
        set: Option<Theme>,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dispatch a parsed command against an open session.
pub fn run<K: KeyValueStore>(session: &mut Session<K>, command: Commands) -> Result<()> {
    match command {
        Commands::Add { text, priority, category, due } => cmd_add(session, &text, priority, category, due),
        Commands::List { filter, sort, search, limit } => {
            cmd_list(session, filter, sort, search, limit);
            Ok(())
        }
        Commands::Show { task } => cmd_show(session, &task),
        Commands::Toggle { task } => cmd_toggle(session, &task),
        Commands::Edit { task, text } => cmd_edit(session, &task, &text),
        Commands::Priority { task, priority } => {
            let id = resolve_id(session, &task)?;
            session.set_priority(&id, priority);
            report(session, format!("Priority of {id} set to {priority}"));
            Ok(())
        }
        Commands::Category { task, category } => {
            let id = resolve_id(session, &task)?;
            session.set_category(&id, &category);
            report(session, format!("Category of {id} set to {category}"));
            Ok(())
        }
        Commands::Due { task, when, clear } => cmd_due(session, &task, when, clear),
        Commands::Move { from, to } => cmd_move(session, from, to),
        Commands::Delete { task } => {
            let id = resolve_id(session, &task)?;
            session.remove(&id);
            report(session, format!("Deleted task {id}"));
            Ok(())
        }
        Commands::ClearCompleted => {
            let before = session.all_tasks().len();
            session.clear_completed();
            let removed = before - session.all_tasks().len();
            report(session, format!("Removed {removed} completed task(s)"));
            Ok(())
        }
        Commands::ClearAll => {
            let removed = session.all_tasks().len();
            session.clear_all();
            report(session, format!("Removed {removed} task(s)"));
            Ok(())
        }
        Commands::Stats => {
            print_stats(&session.view().stats);
            Ok(())
        }
        Commands::Theme { toggle, set } => {
            if toggle {
                session.toggle_theme();
            } else if let Some(theme) = set {
                session.set_theme(theme);
            }
            report(session, format!("Theme: {}", session.theme().as_str()));
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Add a new task, optionally with a due date.
pub fn cmd_add<K: KeyValueStore>(
    session: &mut Session<K>,
    text: &str,
    priority: Priority,
    category: Option<String>,
    due: Option<String>,
) -> Result<()> {
    // Validate before creating so a bad date doesn't leave a half-made task.
    let due = due.as_deref().map(parse_due_input).transpose()?;
    let category = category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    let Some(id) = session.create(text, priority, category.as_deref()) else {
        return Err(Error::InvalidArgument("task text cannot be empty".into()));
    };
    if due.is_some() {
        session.set_due_date(&id, due);
    }
    report(session, format!("Added task {id}"));
    Ok(())
}

/// List the projected view with a stats footer.
pub fn cmd_list<K: KeyValueStore>(
    session: &mut Session<K>,
    filter: Filter,
    sort: SortKey,
    search: Option<String>,
    limit: Option<usize>,
) {
    session.set_filter(filter);
    session.set_sort(sort);
    session.set_search(search.unwrap_or_default());

    let view = session.view();
    let mut rows: Vec<(usize, &Task)> = view
        .tasks
        .iter()
        .map(|t| (session.store().position(&t.id).unwrap_or(0) + 1, *t))
        .collect();
    if let Some(n) = limit {
        rows.truncate(n);
    }
    print_table(&rows);
    println!();
    print_stats(&view.stats);
}

/// Print every field of one task.
pub fn cmd_show<K: KeyValueStore>(session: &Session<K>, query: &str) -> Result<()> {
    let task = session.store().resolve(query)?;
    let now = session.store().now();
    println!("ID:        {}", task.id);
    println!("Text:      {}", task.text);
    println!("Done:      {}", if task.completed { "yes" } else { "no" });
    println!("Priority:  {}", task.priority);
    println!("Category:  {}", task.category);
    println!("Created:   {}", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("Updated:   {}", task.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    match task.due_date {
        Some(due) => {
            let days = days_until_due(due, now);
            let note = if days < 0 {
                format!("{} day(s) overdue", -days)
            } else if task.is_overdue(now) {
                "overdue".to_string()
            } else {
                format!("{days} day(s) left")
            };
            println!("Due:       {} ({note})", due.with_timezone(&Local).format("%Y-%m-%d"));
        }
        None => println!("Due:       -"),
    }
    Ok(())
}

pub fn cmd_toggle<K: KeyValueStore>(session: &mut Session<K>, query: &str) -> Result<()> {
    let id = resolve_id(session, query)?;
    session.toggle_completion(&id);
    let done = session.store().get(&id).is_some_and(|t| t.completed);
    report(
        session,
        format!("Task {id} marked {}", if done { "done" } else { "not done" }),
    );
    Ok(())
}

pub fn cmd_edit<K: KeyValueStore>(session: &mut Session<K>, query: &str, text: &str) -> Result<()> {
    let id = resolve_id(session, query)?;
    if session.edit_text(&id, text) {
        report(session, format!("Updated task {id}"));
    } else {
        eprintln!("Task text cannot be empty; edit discarded.");
    }
    Ok(())
}

pub fn cmd_due<K: KeyValueStore>(
    session: &mut Session<K>,
    query: &str,
    when: Option<String>,
    clear: bool,
) -> Result<()> {
    let id = resolve_id(session, query)?;
    let due = if clear {
        None
    } else {
        when.as_deref().map(parse_due_input).transpose()?
    };
    session.set_due_date(&id, due);
    report(
        session,
        match due {
            Some(d) => format!("Task {id} due {}", d.with_timezone(&Local).format("%Y-%m-%d")),
            None => format!("Cleared due date of {id}"),
        },
    );
    Ok(())
}

/// Move using 1-based positions.
pub fn cmd_move<K: KeyValueStore>(session: &mut Session<K>, from: usize, to: usize) -> Result<()> {
    // 0 maps to usize::MAX, which the store rejects as out of range
    let moved = session.reorder(from.wrapping_sub(1), to.wrapping_sub(1));
    if !moved {
        return Err(Error::InvalidArgument(format!(
            "position out of range (1-{})",
            session.all_tasks().len()
        )));
    }
    report(session, format!("Moved task from position {from} to {to}"));
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn resolve_id<K: KeyValueStore>(session: &Session<K>, query: &str) -> Result<String> {
    Ok(session.store().resolve(query)?.id.clone())
}

/// Print a confirmation, plus a warning if the last write did not stick.
fn report<K: KeyValueStore>(session: &Session<K>, message: String) {
    println!("{message}");
    if let Some(err) = session.last_save_error() {
        eprintln!("Warning: changes were not saved: {err}");
    }
}

/// Print tasks as a table. Each row carries its position in the manual order.
pub fn print_table(rows: &[(usize, &Task)]) {
    println!(
        "{:<4} {:<12} {:<4} {:<6} {:<12} {:<12} {}",
        "#", "ID", "Done", "Pri", "Due", "Category", "Text"
    );
    let today = Local::now().date_naive();
    for (pos, t) in rows {
        let due_day = t.due_date.map(local_day);
        let mut due = format_due_relative(due_day, today);
        if !t.completed && due_day.is_some_and(|d| is_overdue_day(d, today)) {
            due.push('!');
        }
        println!(
            "{:<4} {:<12} {:<4} {:<6} {:<12} {:<12} {}",
            pos,
            truncate(&t.id, 12),
            if t.completed { "x" } else { "" },
            t.priority.label(),
            due,
            truncate(&t.category, 12),
            t.text
        );
    }
}

pub fn print_stats(stats: &Stats) {
    println!(
        "{} total, {} active, {} completed, {} overdue",
        stats.total, stats.active, stats.completed, stats.overdue
    );
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
