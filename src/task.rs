//! Task data structure and id generation.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fields::Priority;

/// Category assigned when the caller does not pick one.
pub const DEFAULT_CATEGORY: &str = "General";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_RANDOM_LEN: usize = 9;

/// A single user-entered item.
///
/// Field names serialize in camelCase (`createdAt`, `dueDate`, ...) and
/// timestamps as RFC 3339 strings, so a stored collection reads back to
/// instant-equal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Task {
    /// Build a fresh, incomplete task. `text` must already be trimmed and non-empty.
    pub fn new(
        id: String,
        text: String,
        priority: Priority,
        category: String,
        now: DateTime<Utc>,
    ) -> Self {
        Task {
            id,
            text,
            completed: false,
            priority,
            category,
            created_at: now,
            updated_at: now,
            due_date: None,
        }
    }

    /// Refresh `updated_at`. The new value is always strictly later than the
    /// previous one, even if the clock has not advanced.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }

    /// Incomplete with a due date strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Generate a task id: the millisecond timestamp in base36 followed by nine
/// random base36 characters.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let mut id = to_base36(millis);
    let mut rng = rand::thread_rng();
    for _ in 0..ID_RANDOM_LEN {
        id.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
    }
    id
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
