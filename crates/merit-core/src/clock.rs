//! Wall-clock access for the store.
//!
//! Records are bucketed by the *local* calendar day, so everything that needs
//! "now" or "today" goes through a [`Clock`] to keep tests deterministic.

use chrono::{DateTime, Local, NaiveDate};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Format a date as the `YYYY-MM-DD` bucket key.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a local time as `HH:mm`.
pub fn format_time(instant: &DateTime<Local>) -> String {
    instant.format("%H:%M").to_string()
}

/// Parse a `YYYY-MM-DD` bucket key.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
