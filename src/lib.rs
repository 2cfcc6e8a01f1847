//! # tasklist
//!
//! A local task-list engine: short text items with priority, category,
//! due date and completion state, kept in a user-controlled order and
//! persisted after every change.
//!
//! ## Layers
//!
//! - [`store::TaskStore`] owns the ordered collection and every mutation.
//!   It has no storage dependency.
//! - [`view::project`] derives the visible, sorted list and the stats from
//!   the collection plus the current [`view::Settings`].
//! - [`persist::KeyValueStore`] is the durable storage capability;
//!   [`persist::FileStore`] keeps one JSON file per key.
//! - [`session::Session`] binds a store to a key-value backend and writes
//!   after each mutation.
//!
//! ```
//! use tasklist::fields::{Priority, SortKey};
//! use tasklist::persist::MemoryStore;
//! use tasklist::session::Session;
//!
//! let mut session = Session::open(MemoryStore::new(), None);
//! session.create("Water the plants", Priority::Low, None);
//! session.create("File taxes", Priority::High, Some("Admin"));
//! session.set_sort(SortKey::Priority);
//! let view = session.view();
//! assert_eq!(view.tasks[0].text, "File taxes");
//! assert_eq!(view.stats.active, 2);
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod error;
pub mod fields;
pub mod persist;
pub mod session;
pub mod store;
pub mod task;
pub mod view;

pub use error::{Error, Result};
