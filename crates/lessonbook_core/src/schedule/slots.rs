//! Weekly slot deduplication.
//!
//! A recurring class is stored once per calendar date. Person lookups want one
//! row per recurring slot, keyed by `(weekday, start time-of-day)` at minute
//! precision. The first lesson seen for a key, in store order, represents it.

use crate::model::lesson::{Lesson, LessonId};
use crate::model::person::RoleFilter;
use crate::repo::lesson_repo::{LessonListQuery, LessonRepository, RepoResult};
use chrono::{NaiveTime, Timelike, Weekday};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySlot {
    /// Id of the representative lesson.
    pub lesson_id: LessonId,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub subject: String,
    pub teacher: String,
    pub student: Option<String>,
    pub room: String,
}

/// Lessons for `person` (substring, case-insensitive) reduced to weekly slots.
pub fn weekly_slots<L>(
    lessons: &L,
    person: &str,
    role: RoleFilter,
    default_room: &str,
) -> RepoResult<Vec<WeeklySlot>>
where
    L: LessonRepository + ?Sized,
{
    let matching = lessons.list_lessons(&LessonListQuery::for_person(person, role))?;
    Ok(dedup_weekly_slots(matching, default_room))
}

/// Keeps the first lesson for each `(weekday, HH:MM)` start, preserving order.
pub fn dedup_weekly_slots(
    lessons: impl IntoIterator<Item = Lesson>,
    default_room: &str,
) -> Vec<WeeklySlot> {
    let mut seen = HashSet::new();
    let mut slots = Vec::new();

    for lesson in lessons {
        let start = lesson.start_time_of_day();
        if !seen.insert((lesson.weekday(), start.hour(), start.minute())) {
            continue;
        }
        slots.push(to_slot(lesson, default_room));
    }

    slots
}

fn to_slot(lesson: Lesson, default_room: &str) -> WeeklySlot {
    let weekday = lesson.weekday();
    let room = if lesson.room.trim().is_empty() {
        default_room.to_string()
    } else {
        lesson.room
    };
    WeeklySlot {
        lesson_id: lesson.id,
        weekday,
        start: lesson.start.time(),
        end: lesson.end.time(),
        subject: lesson.subject,
        teacher: lesson.teacher.name,
        student: lesson.student.map(|student| student.name),
        room,
    }
}
