//! crates/production_tracker_core/src/clock.rs
//!
//! Site-local time. The plant runs on Malaysia time (UTC+8, no daylight saving),
//! so every date and timestamp the tracker produces is taken in that offset.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::ports::Clock;

const SITE_OFFSET_SECONDS: i32 = 8 * 3600;

/// Format of timestamps written to storage and the spreadsheet.
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn site_offset() -> FixedOffset {
    // 8 hours is always within the ±24h range accepted by `east_opt`.
    FixedOffset::east_opt(SITE_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// The wall clock, read in site-local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&site_offset())
    }
}

/// `YYYY-MM-DD HH:MM:SS` for the given clock.
pub fn db_timestamp(clock: &dyn Clock) -> String {
    clock.now().format(DB_TIMESTAMP_FORMAT).to_string()
}

/// `YYYY-MM-DD` for the given clock.
pub fn today_iso(clock: &dyn Clock) -> String {
    clock.now().format("%Y-%m-%d").to_string()
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parses a `YYYY-MM-DD HH:MM:SS` site-local timestamp.
    pub fn at(timestamp: &str) -> Option<Self> {
        chrono::NaiveDateTime::parse_from_str(timestamp, DB_TIMESTAMP_FORMAT)
            .ok()
            .and_then(|naive| naive.and_local_timezone(site_offset()).single())
            .map(FixedClock)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
