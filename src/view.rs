//! Derived view over the task collection: filter, search, sort and stats.
//!
//! [`project`] is a pure function of the collection, the view settings and
//! the evaluation time. It borrows the tasks and never reorders the
//! canonical collection.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use feruca::Collator;

use crate::fields::{Filter, SortKey, Theme};
use crate::task::Task;

/// View settings. Only `theme` outlives the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub filter: Filter,
    pub sort: SortKey,
    pub search: String,
    pub theme: Theme,
}

/// Aggregate counts over the whole collection, independent of the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub overdue: usize,
}

/// The visible list plus stats.
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub tasks: Vec<&'a Task>,
    pub stats: Stats,
}

/// Derive the visible, sorted list and the stats.
pub fn project<'a>(tasks: &'a [Task], settings: &Settings, now: DateTime<Utc>) -> View<'a> {
    let mut visible = visible_tasks(tasks, settings.filter, &settings.search);
    sort_tasks(&mut visible, settings.sort);
    View {
        tasks: visible,
        stats: stats(tasks, now),
    }
}

/// Apply the search query, or the status filter when the query is blank.
/// A non-blank query replaces the status filter rather than narrowing it.
/// Surrounding whitespace is stripped from the query before matching, so
/// " milk " finds "Buy milk".
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: Filter, search: &str) -> Vec<&'a Task> {
    let query = search.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| {
            if query.is_empty() {
                filter.accepts(t.completed)
            } else {
                t.text.to_lowercase().contains(&query) || t.category.to_lowercase().contains(&query)
            }
        })
        .collect()
}

/// Stable sort of a borrowed task list.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey) {
    match key {
        SortKey::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Priority => tasks.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        SortKey::DueDate => tasks.sort_by(|a, b| compare_due(a.due_date, b.due_date)),
        SortKey::Alphabetical => {
            let mut collator = Collator::default();
            tasks.sort_by(|a, b| collator.collate(a.text.as_str(), b.text.as_str()));
        }
    }
}

/// Earlier due dates first; tasks without one go last.
fn compare_due(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn stats(tasks: &[Task], now: DateTime<Utc>) -> Stats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.completed).count();
    let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();
    Stats {
        total,
        completed,
        active: total - completed,
        overdue,
    }
}
