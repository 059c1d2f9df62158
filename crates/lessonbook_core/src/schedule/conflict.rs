//! Interval conflict checker.
//!
//! # Invariants
//! - Overlap is strict: `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && e1 > s2`.
//! - Dimensions are checked teacher, then student, then room; the first hit wins.
//! - People are matched by identity, rooms by exact text.

use crate::model::lesson::{Lesson, LessonId};
use crate::model::person::{normalize_student_name, PersonRole};
use crate::model::window::TimeWindow;
use crate::repo::lesson_repo::{LessonRepository, OverlapFilter, RepoResult};
use crate::repo::person_repo::PersonRepository;
use serde::Serialize;

/// Candidate booking to test against the store.
#[derive(Debug, Clone)]
pub struct ConflictProbe<'a> {
    pub teacher: &'a str,
    /// Skipped when absent, blank or `unknown`.
    pub student: Option<&'a str>,
    /// Skipped when absent or blank.
    pub room: Option<&'a str>,
    pub window: TimeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDimension {
    Teacher,
    Student,
    Room,
}

/// A booking rejected because a dimension is already occupied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub dimension: ConflictDimension,
    /// Human-readable reason naming the occupied teacher, student or room.
    pub reason: String,
    pub existing_lesson: LessonId,
}

impl Conflict {
    fn new(dimension: ConflictDimension, reason: String, existing: &Lesson) -> Self {
        Self {
            dimension,
            reason,
            existing_lesson: existing.id,
        }
    }
}

/// Returns the first conflict for `probe`, or `None` when the window is free.
pub fn check_conflict<L, P>(
    lessons: &L,
    people: &P,
    probe: &ConflictProbe<'_>,
) -> RepoResult<Option<Conflict>>
where
    L: LessonRepository + ?Sized,
    P: PersonRepository + ?Sized,
{
    if let Some(teacher) = people.find_person(probe.teacher, PersonRole::Teacher)? {
        let busy = lessons.find_overlapping(&OverlapFilter::Teacher(teacher.id), &probe.window)?;
        if let Some(existing) = busy.first() {
            return Ok(Some(Conflict::new(
                ConflictDimension::Teacher,
                format!("{} is already booked at that time", teacher.name),
                existing,
            )));
        }
    }

    if let Some(student_name) = normalize_student_name(probe.student) {
        if let Some(student) = people.find_person(&student_name, PersonRole::Student)? {
            let busy =
                lessons.find_overlapping(&OverlapFilter::Student(student.id), &probe.window)?;
            if let Some(existing) = busy.first() {
                return Ok(Some(Conflict::new(
                    ConflictDimension::Student,
                    format!("{} is already booked at that time", student.name),
                    existing,
                )));
            }
        }
    }

    if let Some(room) = probe.room.map(str::trim).filter(|room| !room.is_empty()) {
        let busy = lessons.find_overlapping(&OverlapFilter::Room(room.to_string()), &probe.window)?;
        if let Some(existing) = busy.first() {
            return Ok(Some(Conflict::new(
                ConflictDimension::Room,
                format!(
                    "Room {room} is already occupied ({})",
                    existing.teacher.name
                ),
                existing,
            )));
        }
    }

    Ok(None)
}
