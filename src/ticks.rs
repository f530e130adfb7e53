//! Fixed-epoch "ticks" timestamps.
//!
//! All persisted date fields use ticks: an integer count of 100-nanosecond
//! intervals since 0001-01-01T00:00:00 UTC (10,000 ticks per millisecond).
//! Keeping the conversion in one module means the persisted format is
//! stable regardless of the host platform's native time representation.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Ticks per second (100ns intervals).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01 and the Unix epoch.
pub const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;

/// Convert a UTC datetime to ticks.
pub fn to_ticks(datetime: DateTime<Utc>) -> i64 {
    TICKS_AT_UNIX_EPOCH
        + datetime.timestamp() * TICKS_PER_SECOND
        + i64::from(datetime.timestamp_subsec_nanos()) / 100
}

/// Convert ticks back to a UTC datetime.
///
/// Returns `None` for tick values outside chrono's representable range.
pub fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let relative = ticks - TICKS_AT_UNIX_EPOCH;
    let secs = relative.div_euclid(TICKS_PER_SECOND);
    let nanos = (relative.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Convert a filesystem timestamp to ticks.
///
/// Times before the Unix epoch are clamped to the epoch; SQLite stores
/// signed integers but no real music file predates 1970.
pub fn system_time_to_ticks(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => {
            TICKS_AT_UNIX_EPOCH
                + elapsed.as_secs() as i64 * TICKS_PER_SECOND
                + i64::from(elapsed.subsec_nanos()) / 100
        }
        Err(_) => TICKS_AT_UNIX_EPOCH,
    }
}

/// Clock abstraction so indexing components can be tested with a fixed time.
pub trait Clock: Send + Sync {
    /// The current time in ticks.
    fn now_ticks(&self) -> i64;
}

/// Production clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ticks(&self) -> i64 {
        to_ticks(Utc::now())
    }
}

/// Fixed clock for tests.
#[cfg(test)]
pub struct FixedClock(pub i64);

#[cfg(test)]
impl Clock for FixedClock {
    fn now_ticks(&self) -> i64 {
        self.0
    }
}
