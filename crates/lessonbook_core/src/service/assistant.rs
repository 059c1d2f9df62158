//! Free-text request orchestration: classify, then act.
//!
//! # Invariants
//! - A lookup never writes; a booking writes at most one lesson.
//! - Unclassifiable text produces [`AssistantReply::Unresolved`] with no
//!   side effects and no retry.

use crate::intent::{BookIntent, Intent, IntentError, IntentResolver, DEFAULT_DURATION_MINUTES};
use crate::model::lesson::{Lesson, LessonSource};
use crate::model::person::RoleFilter;
use crate::schedule::conflict::Conflict;
use crate::schedule::slots::WeeklySlot;
use crate::service::schedule_service::{
    BookingOutcome, BookingRequest, ScheduleError, ScheduleService,
};
use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Teacher recorded when a booking intent names none.
const UNKNOWN_TEACHER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    WeeklyTable {
        person: String,
        role: RoleFilter,
        slots: Vec<WeeklySlot>,
    },
    Booked(Lesson),
    Conflict(Conflict),
    Unresolved,
}

#[derive(Debug)]
pub enum AssistantError {
    Intent(IntentError),
    Schedule(ScheduleError),
}

impl Display for AssistantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intent(err) => write!(f, "{err}"),
            Self::Schedule(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssistantError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Intent(err) => Some(err),
            Self::Schedule(err) => Some(err),
        }
    }
}

impl From<IntentError> for AssistantError {
    fn from(value: IntentError) -> Self {
        Self::Intent(value)
    }
}

impl From<ScheduleError> for AssistantError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

pub struct Assistant<'a> {
    schedule: &'a ScheduleService<'a>,
    resolver: &'a dyn IntentResolver,
}

impl<'a> Assistant<'a> {
    pub fn new(schedule: &'a ScheduleService<'a>, resolver: &'a dyn IntentResolver) -> Self {
        Self { schedule, resolver }
    }

    /// Classifies `text` and runs the matching use case.
    ///
    /// `now` is the booking start when the request does not state one.
    pub fn handle(&self, text: &str, now: NaiveDateTime) -> Result<AssistantReply, AssistantError> {
        if text.trim().is_empty() {
            return Ok(AssistantReply::Unresolved);
        }

        match self.resolver.resolve(text)? {
            Some(Intent::Query { person, role }) => {
                let slots = self.schedule.weekly_slots(&person, role)?;
                Ok(AssistantReply::WeeklyTable {
                    person,
                    role,
                    slots,
                })
            }
            Some(Intent::Book(book)) => {
                let request = booking_request(book, now);
                Ok(match self.schedule.book_lesson(&request)? {
                    BookingOutcome::Booked(lesson) => AssistantReply::Booked(lesson),
                    BookingOutcome::Conflict(conflict) => AssistantReply::Conflict(conflict),
                })
            }
            None => Ok(AssistantReply::Unresolved),
        }
    }
}

fn booking_request(book: BookIntent, now: NaiveDateTime) -> BookingRequest {
    BookingRequest {
        teacher: book
            .teacher
            .filter(|teacher| !teacher.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TEACHER.to_string()),
        student: book.student,
        subject: book.subject,
        room: book.room,
        start: book.start.unwrap_or(now),
        duration_minutes: book
            .duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES),
        source: LessonSource::Manual,
    }
}

#[cfg(test)]
mod tests {
    use super::booking_request;
    use crate::intent::BookIntent;
    use chrono::NaiveDate;

    #[test]
    fn missing_booking_fields_take_defaults() {
        let now = NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        let request = booking_request(BookIntent::default(), now);
        assert_eq!(request.teacher, "Unknown");
        assert_eq!(request.start, now);
        assert_eq!(request.duration_minutes, 60);
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let now = NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let request = booking_request(
            BookIntent {
                teacher: Some("Adina".to_string()),
                duration_minutes: Some(0),
                ..BookIntent::default()
            },
            now,
        );
        assert_eq!(request.teacher, "Adina");
        assert_eq!(request.duration_minutes, 60);
    }
}
