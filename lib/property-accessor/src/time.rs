//! Microsecond timestamps.
//!
//! Dates are persisted as signed microseconds since the Unix epoch, so every
//! date handed to the codec is truncated to that precision first.

use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// Microseconds since the Unix epoch.
pub fn to_micros(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_micros()
}

/// Inverse of [`to_micros`]. `None` when outside chrono's representable range.
pub fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

/// Drop sub-microsecond precision.
pub fn truncate_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    from_micros(to_micros(&dt)).unwrap_or(dt)
}

pub(crate) fn system_time_to_utc(time: SystemTime) -> DateTime<Utc> {
    truncate_micros(DateTime::<Utc>::from(time))
}
