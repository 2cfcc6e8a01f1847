//! A task store bound to durable storage.
//!
//! `Session` wraps [`TaskStore`] and the view [`Settings`]. Every mutating
//! call runs the store operation and then writes the whole collection to
//! the key-value store. Write failures are logged and remembered but never
//! undo the in-memory change.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fields::{Filter, Priority, SortKey, Theme};
use crate::persist::{encode_tasks, load_tasks, load_theme, KeyValueStore, TASKS_KEY, THEME_KEY};
use crate::store::TaskStore;
use crate::task::Task;
use crate::view::{project, Settings, View};

pub struct Session<K: KeyValueStore> {
    store: TaskStore,
    settings: Settings,
    kv: K,
    last_save_error: Option<String>,
}

impl<K: KeyValueStore> Session<K> {
    /// Load state from `kv`, falling back to an empty collection. The theme
    /// comes from storage, else `ambient_theme`, else light.
    pub fn open(kv: K, ambient_theme: Option<Theme>) -> Self {
        let tasks = load_tasks(&kv);
        let theme = load_theme(&kv).or(ambient_theme).unwrap_or_default();
        info!(tasks = tasks.len(), theme = theme.as_str(), "session opened");
        Session {
            store: TaskStore::new(tasks),
            settings: Settings {
                theme,
                ..Settings::default()
            },
            kv,
            last_save_error: None,
        }
    }

    /// Write everything and hand back the storage adapter.
    pub fn close(mut self) -> Result<K> {
        self.flush()?;
        Ok(self.kv)
    }

    /// Write tasks and theme, returning the first failure.
    pub fn flush(&mut self) -> Result<()> {
        let bytes = encode_tasks(self.store.tasks())?;
        self.kv.save(TASKS_KEY, &bytes)?;
        self.kv.save(THEME_KEY, self.settings.theme.as_str().as_bytes())?;
        self.last_save_error = None;
        Ok(())
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// The canonical collection in manual order.
    pub fn all_tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Message of the most recent failed write, cleared by the next success.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Visible list and stats for the current settings, evaluated now.
    pub fn view(&self) -> View<'_> {
        self.view_at(self.store.now())
    }

    pub fn view_at(&self, now: DateTime<Utc>) -> View<'_> {
        project(self.store.tasks(), &self.settings, now)
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.settings.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.settings.sort = sort;
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.settings.search = query.into();
    }

    pub fn theme(&self) -> Theme {
        self.settings.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.save(THEME_KEY, theme.as_str().as_bytes().to_vec());
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.settings.theme.toggled();
        self.set_theme(theme);
        theme
    }

    pub fn create(&mut self, text: &str, priority: Priority, category: Option<&str>) -> Option<String> {
        self.mutate(|s| s.create(text, priority, category))
    }

    pub fn toggle_completion(&mut self, id: &str) -> bool {
        self.mutate(|s| s.toggle_completion(id))
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.mutate(|s| s.remove(id))
    }

    pub fn edit_text(&mut self, id: &str, new_text: &str) -> bool {
        self.mutate(|s| s.edit_text(id, new_text))
    }

    pub fn set_priority(&mut self, id: &str, priority: Priority) -> bool {
        self.mutate(|s| s.set_priority(id, priority))
    }

    pub fn set_category(&mut self, id: &str, category: &str) -> bool {
        self.mutate(|s| s.set_category(id, category))
    }

    pub fn set_due_date(&mut self, id: &str, due: Option<DateTime<Utc>>) -> bool {
        self.mutate(|s| s.set_due_date(id, due))
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        self.mutate(|s| s.reorder(from, to))
    }

    pub fn clear_completed(&mut self) -> bool {
        self.mutate(TaskStore::clear_completed)
    }

    pub fn clear_all(&mut self) -> bool {
        self.mutate(TaskStore::clear_all)
    }

    /// Run a store operation, then persist the collection.
    fn mutate<R>(&mut self, op: impl FnOnce(&mut TaskStore) -> R) -> R {
        let out = op(&mut self.store);
        match encode_tasks(self.store.tasks()) {
            Ok(bytes) => self.save(TASKS_KEY, bytes),
            Err(e) => self.record_failure(TASKS_KEY, e.to_string()),
        }
        out
    }

    fn save(&mut self, key: &str, bytes: Vec<u8>) {
        match self.kv.save(key, &bytes) {
            Ok(()) => {
                debug!(key, "flushed");
                self.last_save_error = None;
            }
            Err(e) => self.record_failure(key, e.to_string()),
        }
    }

    fn record_failure(&mut self, key: &str, message: String) {
        warn!(key, "save failed, keeping in-memory state: {message}");
        self.last_save_error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{decode_tasks, MemoryStore};
    use chrono::Duration;

    fn open() -> Session<MemoryStore> {
        Session::open(MemoryStore::new(), None)
    }

    fn stored(session: &Session<MemoryStore>) -> Vec<Task> {
        decode_tasks(session.kv().get(TASKS_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_every_mutation_flushes() {
        let mut s = open();
        let id = s.create("a", Priority::Medium, None).unwrap();
        assert_eq!(s.kv().save_count, 1);
        s.toggle_completion(&id);
        s.edit_text(&id, "b");
        s.set_priority(&id, Priority::High);
        s.set_category(&id, "Work");
        s.set_due_date(&id, None);
        s.reorder(0, 0);
        s.clear_completed();
        s.clear_all();
        s.remove("missing");
        assert_eq!(s.kv().save_count, 10);
        assert!(stored(&s).is_empty());
    }

    #[test]
    fn test_view_settings_do_not_flush() {
        let mut s = open();
        s.set_filter(Filter::Completed);
        s.set_sort(SortKey::Priority);
        s.set_search("x");
        assert_eq!(s.kv().save_count, 0);
        assert_eq!(s.settings().sort, SortKey::Priority);
    }

    #[test]
    fn test_stored_state_matches_memory() {
        let mut s = open();
        let a = s.create("Buy milk", Priority::Low, Some("Home")).unwrap();
        s.create("Call mom", Priority::High, None);
        s.toggle_completion(&a);
        assert_eq!(stored(&s), s.all_tasks());
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let mut kv = MemoryStore::new();
        kv.fail_saves = true;
        let mut s = Session::open(kv, None);
        let id = s.create("still here", Priority::Medium, None).unwrap();
        assert_eq!(s.all_tasks().len(), 1);
        assert!(s.last_save_error().is_some());
        assert!(s.kv().get(TASKS_KEY).is_none());
        assert!(s.toggle_completion(&id));
        assert!(s.all_tasks()[0].completed);
    }

    #[test]
    fn test_open_restores_tasks() {
        let mut s = open();
        let id = s.create("persisted", Priority::High, None).unwrap();
        s.set_due_date(&id, Some(Utc::now() + Duration::days(1)));
        let before = s.all_tasks().to_vec();
        let kv = s.close().unwrap();

        let reopened = Session::open(kv, None);
        assert_eq!(reopened.all_tasks(), before.as_slice());
    }

    #[test]
    fn test_open_with_corrupt_state_is_empty() {
        let mut kv = MemoryStore::new();
        kv.insert(TASKS_KEY, "{broken");
        let mut s = Session::open(kv, None);
        assert!(s.all_tasks().is_empty());
        assert!(s.create("usable", Priority::Medium, None).is_some());
    }

    #[test]
    fn test_theme_bootstrap_and_toggle() {
        assert_eq!(open().theme(), Theme::Light);
        assert_eq!(Session::open(MemoryStore::new(), Some(Theme::Dark)).theme(), Theme::Dark);

        let mut kv = MemoryStore::new();
        kv.insert(THEME_KEY, "dark");
        let mut s = Session::open(kv, Some(Theme::Light));
        assert_eq!(s.theme(), Theme::Dark);
        assert_eq!(s.toggle_theme(), Theme::Light);
        assert_eq!(s.kv().get(THEME_KEY), Some(&b"light"[..]));
        s.set_theme(Theme::Dark);
        assert_eq!(s.kv().get(THEME_KEY), Some(&b"dark"[..]));
    }

    #[test]
    fn test_view_uses_settings() {
        let mut s = open();
        let a = s.create("Buy milk", Priority::Medium, None).unwrap();
        s.create("Call mom", Priority::Medium, None);
        s.toggle_completion(&a);
        s.set_filter(Filter::Active);
        assert_eq!(s.view().tasks.len(), 1);
        assert_eq!(s.view().tasks[0].text, "Call mom");
        s.set_search("milk");
        assert_eq!(s.view().tasks[0].text, "Buy milk");
        assert_eq!(s.view().stats.total, 2);
    }
}
