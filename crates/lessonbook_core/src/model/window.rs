//! Half-open time windows used for conflict detection.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    /// Builds a window, returning `None` unless `start < end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Builds `[start, start + minutes)`. Zero-length windows are rejected.
    pub fn from_duration(start: NaiveDateTime, minutes: u32) -> Option<Self> {
        let end = start.checked_add_signed(Duration::try_minutes(i64::from(minutes))?)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Strict overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[cfg(test)]
mod tests {
    use super::TimeWindow;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn rejects_empty_and_reversed_windows() {
        assert!(TimeWindow::new(at(9, 0), at(9, 0)).is_none());
        assert!(TimeWindow::new(at(10, 0), at(9, 0)).is_none());
        assert!(TimeWindow::from_duration(at(9, 0), 0).is_none());
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let first = TimeWindow::new(at(9, 0), at(10, 0)).unwrap();
        let second = TimeWindow::new(at(10, 0), at(11, 0)).unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn nested_and_partial_windows_overlap() {
        let outer = TimeWindow::new(at(9, 0), at(10, 30)).unwrap();
        let inner = TimeWindow::from_duration(at(9, 30), 30).unwrap();
        let partial = TimeWindow::from_duration(at(10, 0), 60).unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&partial));
    }
}
