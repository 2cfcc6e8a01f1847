//! Error types for the task engine and its storage adapters.
//!
//! The engine itself never fails: unknown ids and invalid input are no-ops.
//! These errors come from the storage adapters, configuration, and the
//! task lookups the terminal front end performs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tasklist operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Stored tasks are invalid: {0}")]
    CorruptState(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Could not determine a data directory (HOME is unset); pass --dir or set TASKLIST_DIR")]
    NoHome,

    #[error("Data directory is not usable: {0}")]
    DataDir(PathBuf),

    #[error("No task found matching '{0}'")]
    TaskNotFound(String),

    #[error("'{query}' matches {count} tasks; use a longer id prefix")]
    AmbiguousTask { query: String, count: usize },

    #[error("Unrecognised due date '{0}'. Use YYYY-MM-DD, 'today', 'tomorrow', a weekday, or 'in Nd'")]
    InvalidDueDate(String),
}

/// Result type alias for tasklist operations.
pub type Result<T> = std::result::Result<T, Error>;
