// Rust guideline compliant 2026-10-12

//! Daily redemption window and calendar expiry checks.
//!
//! Windows are compared on minute resolution and never wrap past midnight:
//! a window whose start is later than its end contains no instant at all.

use chrono::{NaiveDate, NaiveTime, Timelike as _};

/// Whether a time of day falls inside a daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    /// `start <= now <= end`.
    InWindow,
    /// Before `start` or after `end`.
    OutOfWindow,
}

/// Whether a calendar validity limit has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarStatus {
    /// No limit, or today is on or before it.
    Current,
    /// Today is after the limit.
    Expired,
}

/// Minutes elapsed since midnight; seconds are ignored.
#[must_use]
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inclusive check of `now` against the daily window `[start, end]`.
#[must_use]
pub fn check_window(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> WindowStatus {
    let now = minutes_since_midnight(now);
    if (minutes_since_midnight(start)..=minutes_since_midnight(end)).contains(&now) {
        WindowStatus::InWindow
    } else {
        WindowStatus::OutOfWindow
    }
}

/// `Expired` iff `validity_until` is set and `today` is later.
#[must_use]
pub fn check_calendar(validity_until: Option<NaiveDate>, today: NaiveDate) -> CalendarStatus {
    match validity_until {
        Some(until) if today > until => CalendarStatus::Expired,
        _ => CalendarStatus::Current,
    }
}
