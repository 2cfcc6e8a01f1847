//! The canonical task collection and its mutation operations.
//!
//! `TaskStore` knows nothing about storage. Every operation either applies
//! completely or is a no-op; the returned `bool` says whether anything
//! changed so a caller can report it. Persistence is layered on top by
//! [`crate::session::Session`].

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fields::Priority;
use crate::task::{generate_id, Task, DEFAULT_CATEGORY};

/// Source of "now" for timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Ordered, in-memory task collection. Order is the user's manual order.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    clock: Clock,
}

impl Default for TaskStore {
    fn default() -> Self {
        TaskStore::new(Vec::new())
    }
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        TaskStore {
            tasks,
            clock: Utc::now,
        }
    }

    /// Replace the time source, mainly for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The canonical collection in manual order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Position of a task in the manual order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Apply `f` to the task with `id` and refresh its `updated_at`.
    fn update(&mut self, id: &str, f: impl FnOnce(&mut Task)) -> bool {
        let now = self.now();
        match self.get_mut(id) {
            Some(task) => {
                f(task);
                task.touch(now);
                true
            }
            None => {
                debug!(id, "update on unknown task ignored");
                false
            }
        }
    }

    /// Append a new task. Returns its id, or `None` when `text` is blank.
    pub fn create(&mut self, text: &str, priority: Priority, category: Option<&str>) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            debug!("create with blank text ignored");
            return None;
        }
        let now = self.now();
        let mut id = generate_id(now);
        while self.get(&id).is_some() {
            id = generate_id(now);
        }
        let category = category.unwrap_or(DEFAULT_CATEGORY).to_string();
        self.tasks
            .push(Task::new(id.clone(), text.to_string(), priority, category, now));
        debug!(%id, "task created");
        Some(id)
    }

    /// Flip the completion flag.
    pub fn toggle_completion(&mut self, id: &str) -> bool {
        self.update(id, |t| t.completed = !t.completed)
    }

    /// Delete the task with `id`.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        before != self.tasks.len()
    }

    /// Replace the text. Blank replacements are discarded.
    pub fn edit_text(&mut self, id: &str, new_text: &str) -> bool {
        let text = new_text.trim();
        if text.is_empty() {
            debug!(id, "edit with blank text ignored");
            return false;
        }
        self.update(id, |t| t.text = text.to_string())
    }

    pub fn set_priority(&mut self, id: &str, priority: Priority) -> bool {
        self.update(id, |t| t.priority = priority)
    }

    pub fn set_category(&mut self, id: &str, category: &str) -> bool {
        self.update(id, |t| t.category = category.to_string())
    }

    pub fn set_due_date(&mut self, id: &str, due: Option<DateTime<Utc>>) -> bool {
        self.update(id, |t| t.due_date = due)
    }

    /// Move the task at `from` so it ends up at `to`. Out-of-range indices
    /// are ignored. Timestamps are left alone.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.tasks.len();
        if from >= len || to >= len {
            debug!(from, to, len, "reorder out of range ignored");
            return false;
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        true
    }

    /// Remove every completed task, keeping the rest in order.
    pub fn clear_completed(&mut self) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        before != self.tasks.len()
    }

    pub fn clear_all(&mut self) -> bool {
        let changed = !self.tasks.is_empty();
        self.tasks.clear();
        changed
    }

    /// Resolve a user-supplied identifier: exact id, then unique id prefix,
    /// then unique case-insensitive text match.
    pub fn resolve(&self, query: &str) -> Result<&Task> {
        let query = query.trim();
        if let Some(task) = self.get(query) {
            return Ok(task);
        }
        let by_prefix: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| !query.is_empty() && t.id.starts_with(query))
            .collect();
        match by_prefix.len() {
            1 => return Ok(by_prefix[0]),
            n if n > 1 => {
                return Err(Error::AmbiguousTask {
                    query: query.to_string(),
                    count: n,
                })
            }
            _ => {}
        }
        let lowered = query.to_lowercase();
        let by_text: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.text.to_lowercase() == lowered)
            .collect();
        match by_text.len() {
            0 => Err(Error::TaskNotFound(query.to_string())),
            1 => Ok(by_text[0]),
            n => Err(Error::AmbiguousTask {
                query: query.to_string(),
                count: n,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store_with(texts: &[&str]) -> (TaskStore, Vec<String>) {
        let mut store = TaskStore::default();
        let ids = texts
            .iter()
            .map(|t| store.create(t, Priority::Medium, None).unwrap())
            .collect();
        (store, ids)
    }

    fn texts(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_create_trims_and_rejects_blank() {
        let mut store = TaskStore::default();
        assert_eq!(store.create("", Priority::Medium, None), None);
        assert_eq!(store.create("   ", Priority::High, None), None);
        assert!(store.is_empty());

        let id = store.create("  buy milk  ", Priority::Medium, None).unwrap();
        let task = store.get(&id).unwrap();
        assert_eq!(task.text, "buy milk");
        assert!(!task.completed);
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_create_appends_at_end() {
        let (mut store, _) = store_with(&["a", "b"]);
        store.create("c", Priority::Low, Some("Work"));
        assert_eq!(texts(&store), vec!["a", "b", "c"]);
        assert_eq!(store.tasks()[2].category, "Work");
        assert_eq!(store.tasks()[2].priority, Priority::Low);
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let (mut store, ids) = store_with(&["a"]);
        let t0 = store.get(&ids[0]).unwrap().updated_at;
        assert!(store.toggle_completion(&ids[0]));
        let t1 = store.get(&ids[0]).unwrap().updated_at;
        assert!(store.get(&ids[0]).unwrap().completed);
        assert!(store.toggle_completion(&ids[0]));
        let t2 = store.get(&ids[0]).unwrap().updated_at;
        assert!(!store.get(&ids[0]).unwrap().completed);
        assert!(t0 < t1 && t1 < t2);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let (mut store, _) = store_with(&["a"]);
        let snapshot = store.tasks().to_vec();
        assert!(!store.toggle_completion("nope"));
        assert!(!store.remove("nope"));
        assert!(!store.edit_text("nope", "x"));
        assert!(!store.set_priority("nope", Priority::High));
        assert!(!store.set_category("nope", "Work"));
        assert!(!store.set_due_date("nope", Some(Utc::now())));
        assert_eq!(store.tasks(), snapshot.as_slice());
    }

    #[test]
    fn test_edit_text_blank_is_discarded() {
        let (mut store, ids) = store_with(&["original"]);
        let before = store.get(&ids[0]).unwrap().updated_at;
        assert!(!store.edit_text(&ids[0], ""));
        assert!(!store.edit_text(&ids[0], "  "));
        assert_eq!(store.get(&ids[0]).unwrap().text, "original");
        assert_eq!(store.get(&ids[0]).unwrap().updated_at, before);

        assert!(store.edit_text(&ids[0], "  renamed "));
        assert_eq!(store.get(&ids[0]).unwrap().text, "renamed");
        assert!(store.get(&ids[0]).unwrap().updated_at > before);
    }

    #[test]
    fn test_field_setters_refresh_updated_at() {
        let (mut store, ids) = store_with(&["a"]);
        let id = &ids[0];
        let created = store.get(id).unwrap().created_at;
        let mut last = store.get(id).unwrap().updated_at;

        store.set_priority(id, Priority::High);
        assert_eq!(store.get(id).unwrap().priority, Priority::High);
        assert!(store.get(id).unwrap().updated_at > last);
        last = store.get(id).unwrap().updated_at;

        store.set_category(id, "Errands");
        assert_eq!(store.get(id).unwrap().category, "Errands");
        assert!(store.get(id).unwrap().updated_at > last);
        last = store.get(id).unwrap().updated_at;

        let due = Utc::now();
        store.set_due_date(id, Some(due));
        assert_eq!(store.get(id).unwrap().due_date, Some(due));
        assert!(store.get(id).unwrap().updated_at > last);
        store.set_due_date(id, None);
        assert_eq!(store.get(id).unwrap().due_date, None);
        assert_eq!(store.get(id).unwrap().created_at, created);
    }

    #[test]
    fn test_reorder_moves_without_touching() {
        let (mut store, _) = store_with(&["a", "b", "c", "d"]);
        let stamps: Vec<_> = store.tasks().iter().map(|t| t.updated_at).collect();
        assert!(store.reorder(0, 2));
        assert_eq!(texts(&store), vec!["b", "c", "a", "d"]);
        assert!(store.reorder(3, 0));
        assert_eq!(texts(&store), vec!["d", "b", "c", "a"]);
        let mut after: Vec<_> = store.tasks().iter().map(|t| t.updated_at).collect();
        let mut expected = stamps.clone();
        after.sort();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_reorder_out_of_range_is_noop() {
        let (mut store, _) = store_with(&["a", "b"]);
        assert!(!store.reorder(2, 0));
        assert!(!store.reorder(0, 2));
        assert!(!store.reorder(usize::MAX, 0));
        assert_eq!(texts(&store), vec!["a", "b"]);
        let mut empty = TaskStore::default();
        assert!(!empty.reorder(0, 0));
    }

    #[test]
    fn test_clear_completed_keeps_order() {
        let (mut store, ids) = store_with(&["a", "b", "c", "d"]);
        store.toggle_completion(&ids[1]);
        store.toggle_completion(&ids[3]);
        assert!(store.clear_completed());
        assert_eq!(texts(&store), vec!["a", "c"]);
        assert!(!store.clear_completed());
        assert!(store.clear_all());
        assert!(store.is_empty());
        assert!(!store.clear_all());
    }

    #[test]
    fn test_remove() {
        let (mut store, ids) = store_with(&["a", "b", "c"]);
        assert!(store.remove(&ids[1]));
        assert_eq!(texts(&store), vec!["a", "c"]);
        assert_eq!(store.position(&ids[2]), Some(1));
    }

    #[test]
    fn test_resolve() {
        let mut store = TaskStore::new(Vec::new());
        let now = Utc::now();
        store.tasks.push(Task::new("abc123".into(), "Buy milk".into(), Priority::Low, "Home".into(), now));
        store.tasks.push(Task::new("abd456".into(), "Call mom".into(), Priority::Low, "Home".into(), now));

        assert_eq!(store.resolve("abc123").unwrap().text, "Buy milk");
        assert_eq!(store.resolve("abd").unwrap().text, "Call mom");
        assert_eq!(store.resolve("call MOM").unwrap().id, "abd456");
        assert!(matches!(store.resolve("ab"), Err(Error::AmbiguousTask { count: 2, .. })));
        assert!(matches!(store.resolve("zzz"), Err(Error::TaskNotFound(_))));
    }

    #[test]
    fn test_custom_clock() {
        use chrono::TimeZone;
        fn fixed() -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        }
        let mut store = TaskStore::default().with_clock(fixed);
        let id = store.create("a", Priority::Medium, None).unwrap();
        assert_eq!(store.get(&id).unwrap().created_at, fixed());
        store.toggle_completion(&id);
        assert!(store.get(&id).unwrap().updated_at > fixed());
    }

    proptest! {
        #[test]
        fn prop_ids_stay_unique(ops in prop::collection::vec((any::<bool>(), 0usize..8), 0..60)) {
            let mut store = TaskStore::default();
            for (create, idx) in ops {
                if create || store.is_empty() {
                    store.create("task", Priority::Medium, None);
                } else {
                    let id = store.tasks()[idx % store.len()].id.clone();
                    store.remove(&id);
                }
            }
            let mut ids: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }

        #[test]
        fn prop_reorder_inverse_restores(len in 2usize..10, i in 0usize..10, j in 0usize..10) {
            let (i, j) = (i % len, j % len);
            prop_assume!(i != j);
            let mut store = TaskStore::default();
            for n in 0..len {
                store.create(&format!("t{n}"), Priority::Medium, None);
            }
            let original: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
            prop_assert!(store.reorder(i, j));
            prop_assert!(store.reorder(j, i));
            let restored: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
            prop_assert_eq!(restored, original);
        }
    }
}
