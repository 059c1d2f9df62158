//! Timestamp encoding for the `lessons` table.
//!
//! Lesson times are wall-clock values without a zone. They are persisted as
//! epoch milliseconds of the naive value read as UTC, so ordering and overlap
//! comparisons in SQL match comparisons on `NaiveDateTime`.

use chrono::{DateTime, NaiveDateTime};

pub(crate) fn to_epoch_ms(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(value).map(|instant| instant.naive_utc())
}
