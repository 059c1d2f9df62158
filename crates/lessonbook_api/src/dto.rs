//! Wire shapes. Times are rendered `HH:MM`, dates `YYYY-MM-DD`.

use lessonbook_core::model::lesson::weekday_index;
use lessonbook_core::{Lesson, LessonView, WeeklySlot};
use serde::{Deserialize, Serialize};

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayRequest {
    /// 0 = Monday ... 6 = Sunday.
    pub day_idx: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManualLessonRequest {
    pub teacher: String,
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Blank or missing takes the configured default room.
    #[serde(default)]
    pub room: Option<String>,
    /// Day of the current week, 0 = Monday.
    pub day_idx: i64,
    /// `HH:MM`.
    pub start_time: String,
    /// Minutes; 60 when missing.
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadFileDto {
    pub filename: String,
    /// CSV text of the export.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub files: Vec<UploadFileDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySlotDto {
    pub id: String,
    pub day_idx: u8,
    pub start: String,
    pub end: String,
    pub subject: String,
    pub teacher: String,
    pub student: Option<String>,
    pub room: String,
}

impl From<WeeklySlot> for WeeklySlotDto {
    fn from(value: WeeklySlot) -> Self {
        Self {
            id: value.lesson_id.to_string(),
            day_idx: weekday_index(value.weekday),
            start: value.start.format(TIME_FORMAT).to_string(),
            end: value.end.format(TIME_FORMAT).to_string(),
            subject: value.subject,
            teacher: value.teacher,
            student: value.student,
            room: value.room,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonViewDto {
    pub id: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub subject: String,
    pub teacher: String,
    pub student: Option<String>,
    pub room: String,
}

impl From<LessonView> for LessonViewDto {
    fn from(value: LessonView) -> Self {
        Self {
            id: value.lesson_id.to_string(),
            date: value.date.format(DATE_FORMAT).to_string(),
            start: value.start.format(TIME_FORMAT).to_string(),
            end: value.end.format(TIME_FORMAT).to_string(),
            subject: value.subject,
            teacher: value.teacher,
            student: value.student,
            room: value.room,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonDto {
    pub id: String,
    pub day_idx: u8,
    pub date: String,
    pub start: String,
    pub end: String,
    pub subject: String,
    pub teacher: String,
    pub student: Option<String>,
    pub room: String,
    /// `manual` or the uploaded file name.
    pub source: String,
}

impl From<&Lesson> for LessonDto {
    fn from(value: &Lesson) -> Self {
        Self {
            id: value.id.to_string(),
            day_idx: weekday_index(value.weekday()),
            date: value.start.format(DATE_FORMAT).to_string(),
            start: value.start.format(TIME_FORMAT).to_string(),
            end: value.end.format(TIME_FORMAT).to_string(),
            subject: value.subject.clone(),
            teacher: value.teacher.name.clone(),
            student: value.student_name().map(str::to_string),
            room: value.room.clone(),
            source: value.source.as_db_str().to_string(),
        }
    }
}
