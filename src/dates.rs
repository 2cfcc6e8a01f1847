//! Due date parsing and display helpers.
//!
//! Due dates are stored as instants. User input is day-based, so a parsed
//! date becomes local midnight of that day. The display helpers work on
//! calendar days in the local time zone; the overdue count in
//! [`crate::view::stats`] compares instants instead.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};

const MAX_DUE_YEAR: i32 = 9999;

const WEEKDAYS: [(&str, i64); 14] = [
    ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
    ("friday", 4), ("saturday", 5), ("sunday", 6),
    ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
    ("fri", 4), ("sat", 5), ("sun", 6),
];

/// Parse a due date relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - weekdays ("fri", "next monday", "this sunday")
/// - "in 3d", "in 2w", "in 1m" (a month is 30 days)
/// - "YYYY-MM-DD"
pub fn parse_due_day(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some((idx, _)) = rest.char_indices().last() {
            let (num, unit) = rest.split_at(idx);
            if let Ok(n) = num.trim().parse::<i64>() {
                let offset = match unit {
                    "d" => Duration::try_days(n),
                    "w" => Duration::try_weeks(n),
                    "m" => n.checked_mul(30).and_then(Duration::try_days),
                    _ => None,
                };
                // out-of-range offsets are rejected, not clamped
                return offset.and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let current = i64::from(today.weekday().num_days_from_monday());
    for (name, target) in WEEKDAYS {
        let ahead = (target + 7 - current) % 7;
        if s == name || s == format!("this {name}") {
            return Some(today + Duration::days(ahead));
        }
        if s == format!("next {name}") {
            let ahead = if ahead == 0 { 7 } else { ahead + 7 };
            return Some(today + Duration::days(ahead));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Parse user input into a due instant (local midnight of the chosen day).
/// Years past 9999 are rejected so the stored RFC 3339 form reads back.
pub fn parse_due_input(s: &str) -> Result<DateTime<Utc>> {
    let today = Local::now().date_naive();
    parse_due_day(s, today)
        .filter(|day| (1..=MAX_DUE_YEAR).contains(&day.year()))
        .and_then(local_midnight)
        .ok_or_else(|| Error::InvalidDueDate(s.trim().to_string()))
}

fn local_midnight(day: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calendar day of an instant in the local time zone.
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Whole days until `due`, rounded up. Negative when past.
pub fn days_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (due - now).num_milliseconds();
    let day = Duration::days(1).num_milliseconds();
    // ceiling division
    millis.div_euclid(day) + i64::from(millis.rem_euclid(day) != 0)
}

/// Day-granular overdue check used for display.
pub fn is_overdue_day(due: NaiveDate, today: NaiveDate) -> bool {
    due < today
}

/// Format a due day relative to today ("today", "tomorrow", "in 3d", "2d overdue").
/// Days more than a week out are shown as the date.
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            match delta {
                0 => "today".into(),
                1 => "tomorrow".into(),
                2..=7 => format!("in {delta}d"),
                n if n < 0 => format!("{}d overdue", -n),
                _ => d.format("%Y-%m-%d").to_string(),
            }
        }
    }
}
