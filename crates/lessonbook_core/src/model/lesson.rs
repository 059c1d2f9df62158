//! Lesson domain model.
//!
//! # Responsibility
//! - Define the only scheduled entity: one lesson occurrence on a calendar date.
//! - Provide validation shared by every write path.
//!
//! # Invariants
//! - `start < end`; the occupied interval is `[start, end)`.
//! - `room` is never blank once persisted (blank input takes the default room).
//! - `id` is stable and never reused for another lesson.

use crate::model::person::PersonRef;
use crate::model::window::TimeWindow;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type LessonId = Uuid;

/// Room assigned when neither the caller nor the upload names one.
pub const DEFAULT_ROOM: &str = "Cab 1";
/// Subject assigned when a booking does not name one.
pub const DEFAULT_SUBJECT: &str = "Lesson";

const MANUAL_SOURCE: &str = "manual";

/// Provenance of a lesson row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonSource {
    /// Created through a booking or the manual-create operation.
    Manual,
    /// Imported from an uploaded timetable file with this name.
    Upload(String),
}

impl LessonSource {
    pub fn as_db_str(&self) -> &str {
        match self {
            Self::Manual => MANUAL_SOURCE,
            Self::Upload(file_name) => file_name.as_str(),
        }
    }

    pub fn from_db_str(value: &str) -> Self {
        if value.eq_ignore_ascii_case(MANUAL_SOURCE) {
            Self::Manual
        } else {
            Self::Upload(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub teacher: PersonRef,
    /// `None` when the student is unknown.
    pub student: Option<PersonRef>,
    pub subject: String,
    pub room: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub source: LessonSource,
}

/// Validation failures for lesson write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonValidationError {
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    BlankRoom,
    BlankTeacherName,
}

impl Display for LessonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWindow { start, end } => {
                write!(f, "lesson end {end} must be after start {start}")
            }
            Self::BlankRoom => write!(f, "lesson room must not be blank"),
            Self::BlankTeacherName => write!(f, "lesson teacher name must not be blank"),
        }
    }
}

impl Error for LessonValidationError {}

impl Lesson {
    /// Occupied interval of this lesson.
    ///
    /// Persisted lessons always satisfy `start < end`; for unvalidated values
    /// this returns `None`.
    pub fn window(&self) -> Option<TimeWindow> {
        TimeWindow::new(self.start, self.end)
    }

    pub fn validate(&self) -> Result<(), LessonValidationError> {
        if self.start >= self.end {
            return Err(LessonValidationError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        if self.room.trim().is_empty() {
            return Err(LessonValidationError::BlankRoom);
        }
        if self.teacher.name.trim().is_empty() {
            return Err(LessonValidationError::BlankTeacherName);
        }
        Ok(())
    }

    pub fn weekday(&self) -> Weekday {
        self.start.weekday()
    }

    pub fn start_time_of_day(&self) -> NaiveTime {
        self.start.time()
    }

    pub fn end_time_of_day(&self) -> NaiveTime {
        self.end.time()
    }

    pub fn student_name(&self) -> Option<&str> {
        self.student.as_ref().map(|student| student.name.as_str())
    }
}

/// Maps `0 = Monday .. 6 = Sunday` to a weekday.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Inverse of [`weekday_from_index`].
pub fn weekday_index(weekday: Weekday) -> u8 {
    // num_days_from_monday is always < 7
    weekday.num_days_from_monday() as u8
}
