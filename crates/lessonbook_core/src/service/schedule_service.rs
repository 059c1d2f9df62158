//! Scheduling use-case service.
//!
//! # Responsibility
//! - Book lessons with the conflict check and the insert in one transaction.
//! - Serve weekly slot and whole-day lookups.
//! - Delete lessons by id.
//!
//! # Invariants
//! - A booking that conflicts leaves the store unchanged.
//! - Bookings for placeholder teachers (`TBD`, `unknown`) skip the check.
//! - A booking without a room is checked for teacher and student only and is
//!   stored in the default room.

use crate::intent::keyword::Roster;
use crate::model::lesson::{Lesson, LessonId, LessonSource, DEFAULT_SUBJECT};
use crate::model::person::{
    is_placeholder_teacher, normalize_person_name, normalize_student_name, Person, PersonRef,
    PersonRole, RoleFilter,
};
use crate::model::window::TimeWindow;
use crate::repo::lesson_repo::{LessonRepository, RepoError, SqliteLessonRepository};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::schedule::conflict::{check_conflict, Conflict, ConflictProbe};
use crate::schedule::day::{day_schedule, LessonView};
use crate::schedule::slots::{weekly_slots, WeeklySlot};
use chrono::{NaiveDateTime, Weekday};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug)]
pub enum ScheduleError {
    /// Request fields cannot describe a lesson.
    InvalidRequest(String),
    LessonNotFound(LessonId),
    Repo(RepoError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(message) => write!(f, "invalid booking request: {message}"),
            Self::LessonNotFound(id) => write!(f, "lesson not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ScheduleError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ScheduleError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// One lesson to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub teacher: String,
    /// Blank or `unknown` is stored as "no student".
    pub student: Option<String>,
    /// Blank falls back to [`DEFAULT_SUBJECT`].
    pub subject: Option<String>,
    /// Checked when present; the default room is stored when absent.
    pub room: Option<String>,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub source: LessonSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked(Lesson),
    Conflict(Conflict),
}

pub struct ScheduleService<'conn> {
    conn: &'conn Connection,
    default_room: String,
}

impl<'conn> ScheduleService<'conn> {
    pub fn new(conn: &'conn Connection, default_room: impl Into<String>) -> Self {
        Self {
            conn,
            default_room: default_room.into(),
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    /// Checks `request` for conflicts and stores it when the window is free.
    ///
    /// # Errors
    /// - `InvalidRequest` for a blank teacher, zero duration or a window that
    ///   does not fit the calendar.
    /// - `Repo` for storage failures; the transaction is rolled back.
    pub fn book_lesson(&self, request: &BookingRequest) -> Result<BookingOutcome, ScheduleError> {
        let started_at = Instant::now();
        let teacher_name = normalize_person_name(&request.teacher)
            .ok_or_else(|| ScheduleError::InvalidRequest("teacher is required".to_string()))?;
        if request.duration_minutes == 0 {
            return Err(ScheduleError::InvalidRequest(
                "duration must be greater than zero".to_string(),
            ));
        }
        let window = TimeWindow::from_duration(request.start, request.duration_minutes)
            .ok_or_else(|| {
                ScheduleError::InvalidRequest("lesson window is out of range".to_string())
            })?;
        let student_name = normalize_student_name(request.student.as_deref());
        let room = request
            .room
            .as_deref()
            .map(str::trim)
            .filter(|room| !room.is_empty());

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let lessons = SqliteLessonRepository::new(&tx);
        let people = SqlitePersonRepository::new(&tx);

        if !is_placeholder_teacher(&teacher_name) {
            let probe = ConflictProbe {
                teacher: &teacher_name,
                student: student_name.as_deref(),
                room,
                window,
            };
            if let Some(conflict) = check_conflict(&lessons, &people, &probe)? {
                info!(
                    "event=lesson_book module=service status=skip reason=conflict dimension={:?} existing_lesson={} duration_ms={}",
                    conflict.dimension,
                    conflict.existing_lesson,
                    started_at.elapsed().as_millis()
                );
                return Ok(BookingOutcome::Conflict(conflict));
            }
        }

        let teacher = people.ensure_person(&teacher_name, PersonRole::Teacher)?;
        let student = match student_name.as_deref() {
            Some(name) => Some(people.ensure_person(name, PersonRole::Student)?),
            None => None,
        };
        let subject = request
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
            .unwrap_or(DEFAULT_SUBJECT);

        let lesson = Lesson {
            id: Uuid::new_v4(),
            teacher: PersonRef::from(&teacher),
            student: student.as_ref().map(PersonRef::from),
            subject: subject.to_string(),
            room: room.unwrap_or(&self.default_room).to_string(),
            start: window.start(),
            end: window.end(),
            source: request.source.clone(),
        };

        let result = lessons.create_lesson(&lesson).and_then(|id| {
            tx.commit()?;
            Ok(id)
        });
        match result {
            Ok(id) => {
                info!(
                    "event=lesson_book module=service status=ok lesson_id={} duration_ms={}",
                    id,
                    started_at.elapsed().as_millis()
                );
                Ok(BookingOutcome::Booked(lesson))
            }
            Err(err) => {
                warn!(
                    "event=lesson_book module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Removes one lesson.
    ///
    /// # Errors
    /// - `LessonNotFound` when no lesson has `id`; nothing is changed.
    pub fn delete_lesson(&self, id: LessonId) -> Result<(), ScheduleError> {
        let deleted = SqliteLessonRepository::new(self.conn).delete_lesson(id)?;
        if !deleted {
            info!(
                "event=lesson_delete module=service status=skip reason=not_found lesson_id={}",
                id
            );
            return Err(ScheduleError::LessonNotFound(id));
        }
        info!("event=lesson_delete module=service status=ok lesson_id={id}");
        Ok(())
    }

    /// Recurring weekly slots for `person`, one per `(weekday, start)`.
    pub fn weekly_slots(
        &self,
        person: &str,
        role: RoleFilter,
    ) -> Result<Vec<WeeklySlot>, ScheduleError> {
        let lessons = SqliteLessonRepository::new(self.conn);
        Ok(weekly_slots(&lessons, person, role, &self.default_room)?)
    }

    /// Every stored lesson starting on `weekday`.
    pub fn day_schedule(&self, weekday: Weekday) -> Result<Vec<LessonView>, ScheduleError> {
        let lessons = SqliteLessonRepository::new(self.conn);
        Ok(day_schedule(&lessons, weekday, &self.default_room)?)
    }

    pub fn list_people(&self) -> Result<Vec<Person>, ScheduleError> {
        Ok(SqlitePersonRepository::new(self.conn).list_people(None)?)
    }

    /// `configured` extended with every person already stored.
    pub fn roster(&self, configured: &Roster) -> Result<Roster, ScheduleError> {
        Ok(configured.clone().with_people(&self.list_people()?))
    }
}
