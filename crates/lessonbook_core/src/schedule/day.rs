//! Whole-day listing for the by-room view.

use crate::model::lesson::{Lesson, LessonId};
use crate::repo::lesson_repo::{LessonListQuery, LessonRepository, RepoResult};
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

/// One stored lesson occurrence, unfiltered and undeduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonView {
    pub lesson_id: LessonId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub subject: String,
    pub teacher: String,
    pub student: Option<String>,
    pub room: String,
}

impl LessonView {
    pub fn from_lesson(lesson: Lesson, default_room: &str) -> Self {
        let room = if lesson.room.trim().is_empty() {
            default_room.to_string()
        } else {
            lesson.room
        };
        Self {
            lesson_id: lesson.id,
            date: lesson.start.date(),
            start: lesson.start.time(),
            end: lesson.end.time(),
            subject: lesson.subject,
            teacher: lesson.teacher.name,
            student: lesson.student.map(|student| student.name),
            room,
        }
    }
}

/// Every lesson whose start falls on `weekday`, across all dates and people.
pub fn day_schedule<L>(
    lessons: &L,
    weekday: Weekday,
    default_room: &str,
) -> RepoResult<Vec<LessonView>>
where
    L: LessonRepository + ?Sized,
{
    let matching = lessons.list_lessons(&LessonListQuery::on_weekday(weekday))?;
    Ok(matching
        .into_iter()
        .map(|lesson| LessonView::from_lesson(lesson, default_room))
        .collect())
}
