//! Durable key-value storage for the task collection and the theme.
//!
//! The engine only needs `load` and `save` on opaque byte values. Two
//! adapters are provided: [`FileStore`], which keeps one JSON file per key
//! in a directory, and [`MemoryStore`], which keeps values in memory and
//! can be told to reject writes.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::fields::Theme;
use crate::task::Task;

/// Key under which the task collection is stored.
pub const TASKS_KEY: &str = "todos";
/// Key under which the theme is stored.
pub const THEME_KEY: &str = "theme";

/// Opaque durable key-value capability.
pub trait KeyValueStore {
    /// Read the value under `key`, or `None` if nothing is stored.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Replace the value under `key`.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// One file per key inside a directory: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic-ish write via temp + rename.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.flush()?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), len = bytes.len(), "saved");
        Ok(())
    }
}

/// In-memory store. With `fail_saves` set, every `save` returns an error
/// and leaves the stored values untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Vec<u8>>,
    pub fail_saves: bool,
    pub save_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, bypassing `fail_saves`.
    pub fn insert(&mut self, key: &str, bytes: impl Into<Vec<u8>>) {
        self.values.insert(key.to_string(), bytes.into());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.values.get(key).map(Vec::as_slice)
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_saves {
            return Err(Error::Io(std::io::Error::other(format!(
                "write to '{key}' rejected"
            ))));
        }
        self.values.insert(key.to_string(), bytes.to_vec());
        self.save_count += 1;
        Ok(())
    }
}

/// Serialize the collection as a JSON array of task records.
pub fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(tasks)?)
}

/// Parse a stored collection. Besides well-formed JSON, ids must be unique
/// and every text non-empty with no surrounding whitespace.
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>> {
    let tasks: Vec<Task> = serde_json::from_slice(bytes)?;
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(Error::CorruptState(format!("duplicate id '{}'", task.id)));
        }
        if task.text.is_empty() || task.text.trim() != task.text {
            return Err(Error::CorruptState(format!("task '{}' has blank or untrimmed text", task.id)));
        }
    }
    Ok(tasks)
}

/// Load the task collection. Missing, unreadable or malformed state yields
/// an empty collection; the failure is logged.
pub fn load_tasks<K: KeyValueStore>(kv: &K) -> Vec<Task> {
    let bytes = match kv.load(TASKS_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Vec::new(),
        Err(e) => {
            error!("Error reading tasks, starting fresh: {e}");
            return Vec::new();
        }
    };
    match decode_tasks(&bytes) {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Error parsing tasks, starting fresh: {e}");
            Vec::new()
        }
    }
}

/// Load the stored theme. Unknown values count as absent.
pub fn load_theme<K: KeyValueStore>(kv: &K) -> Option<Theme> {
    match kv.load(THEME_KEY) {
        Ok(Some(bytes)) => std::str::from_utf8(&bytes).ok().and_then(Theme::parse),
        Ok(None) => None,
        Err(e) => {
            error!("Error reading theme: {e}");
            None
        }
    }
}
