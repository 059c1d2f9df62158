//! Lesson repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the store capability used by scheduling logic: overlap lookup,
//!   filtered listing, insert and delete-by-id.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Lesson::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing order is deterministic: `start_at ASC, uuid ASC`.

use crate::db::time::{from_epoch_ms, to_epoch_ms};
use crate::db::DbError;
use crate::model::lesson::{Lesson, LessonId, LessonSource, LessonValidationError};
use crate::model::person::{PersonId, PersonRef, RoleFilter};
use crate::model::window::TimeWindow;
use chrono::Weekday;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LESSON_SELECT_SQL: &str = "SELECT
    lessons.uuid AS uuid,
    lessons.teacher_uuid AS teacher_uuid,
    teacher.name AS teacher_name,
    lessons.student_uuid AS student_uuid,
    student.name AS student_name,
    lessons.subject AS subject,
    lessons.room AS room,
    lessons.start_at AS start_at,
    lessons.end_at AS end_at,
    lessons.source_file AS source_file
FROM lessons
JOIN people AS teacher ON teacher.uuid = lessons.teacher_uuid
LEFT JOIN people AS student ON student.uuid = lessons.student_uuid";

const LESSON_ORDER_SQL: &str = " ORDER BY lessons.start_at ASC, lessons.uuid ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by lesson and person persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(LessonValidationError),
    Db(DbError),
    InvalidPersonName(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidPersonName(value) => write!(f, "invalid person name `{value}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted lesson data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidPersonName(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<LessonValidationError> for RepoError {
    fn from(value: LessonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which lessons an overlap lookup considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlapFilter {
    Teacher(PersonId),
    Student(PersonId),
    /// Exact, case-sensitive room match.
    Room(String),
}

/// Filter options for listing lessons.
#[derive(Debug, Clone, Default)]
pub struct LessonListQuery {
    /// Case-insensitive substring matched against the fields selected by `role`.
    pub name_contains: Option<String>,
    pub role: RoleFilter,
    /// Only lessons starting on this weekday.
    pub weekday: Option<Weekday>,
}

impl LessonListQuery {
    pub fn for_person(name: impl Into<String>, role: RoleFilter) -> Self {
        Self {
            name_contains: Some(name.into()),
            role,
            weekday: None,
        }
    }

    pub fn on_weekday(weekday: Weekday) -> Self {
        Self {
            weekday: Some(weekday),
            ..Self::default()
        }
    }

    /// Returns whether `lesson` passes the name part of this filter. The
    /// weekday part is applied in SQL.
    pub fn matches_name(&self, lesson: &Lesson) -> bool {
        let Some(needle) = self
            .name_contains
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return true;
        };
        let needle = needle.to_lowercase();
        let teacher_hit = || lesson.teacher.name.to_lowercase().contains(&needle);
        let student_hit = || {
            lesson
                .student_name()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        };

        match self.role {
            RoleFilter::Teacher => teacher_hit(),
            RoleFilter::Student => student_hit(),
            RoleFilter::Any => teacher_hit() || student_hit(),
        }
    }
}

/// Repository interface for the lesson store.
pub trait LessonRepository {
    fn create_lesson(&self, lesson: &Lesson) -> RepoResult<LessonId>;
    fn get_lesson(&self, id: LessonId) -> RepoResult<Option<Lesson>>;
    fn list_lessons(&self, query: &LessonListQuery) -> RepoResult<Vec<Lesson>>;
    /// Lessons whose `[start, end)` strictly overlaps `window` and pass `filter`.
    fn find_overlapping(
        &self,
        filter: &OverlapFilter,
        window: &TimeWindow,
    ) -> RepoResult<Vec<Lesson>>;
    /// Returns `false` when no lesson has this id.
    fn delete_lesson(&self, id: LessonId) -> RepoResult<bool>;
}

/// SQLite-backed lesson repository.
pub struct SqliteLessonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLessonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_lessons(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Lesson>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut lessons = Vec::new();
        while let Some(row) = rows.next()? {
            lessons.push(parse_lesson_row(row)?);
        }
        Ok(lessons)
    }
}

impl LessonRepository for SqliteLessonRepository<'_> {
    fn create_lesson(&self, lesson: &Lesson) -> RepoResult<LessonId> {
        lesson.validate()?;

        self.conn.execute(
            "INSERT INTO lessons (
                uuid,
                teacher_uuid,
                student_uuid,
                subject,
                room,
                start_at,
                end_at,
                source_file
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                lesson.id.to_string(),
                lesson.teacher.id.to_string(),
                lesson.student.as_ref().map(|student| student.id.to_string()),
                lesson.subject.as_str(),
                lesson.room.as_str(),
                to_epoch_ms(lesson.start),
                to_epoch_ms(lesson.end),
                lesson.source.as_db_str(),
            ],
        )?;

        Ok(lesson.id)
    }

    fn get_lesson(&self, id: LessonId) -> RepoResult<Option<Lesson>> {
        let lessons = self.query_lessons(
            &format!("{LESSON_SELECT_SQL} WHERE lessons.uuid = ?1;"),
            vec![Value::Text(id.to_string())],
        )?;
        Ok(lessons.into_iter().next())
    }

    fn list_lessons(&self, query: &LessonListQuery) -> RepoResult<Vec<Lesson>> {
        let mut sql = LESSON_SELECT_SQL.to_string();
        let mut bind_values = Vec::new();
        if let Some(weekday) = query.weekday {
            // `%w` counts from Sunday = 0; timestamps are naive values, so the
            // UTC reading is the wall-clock weekday.
            sql.push_str(" WHERE strftime('%w', lessons.start_at / 1000.0, 'unixepoch') = ?");
            bind_values.push(Value::Text(weekday.num_days_from_sunday().to_string()));
        }
        sql.push_str(LESSON_ORDER_SQL);

        // Name matching runs in Rust: SQLite `lower()` only folds ASCII and
        // names are frequently Cyrillic.
        let lessons = self.query_lessons(&sql, bind_values)?;
        Ok(lessons
            .into_iter()
            .filter(|lesson| query.matches_name(lesson))
            .collect())
    }

    fn find_overlapping(
        &self,
        filter: &OverlapFilter,
        window: &TimeWindow,
    ) -> RepoResult<Vec<Lesson>> {
        let mut sql = format!(
            "{LESSON_SELECT_SQL} WHERE lessons.start_at < ? AND lessons.end_at > ?"
        );
        let mut bind_values = vec![
            Value::Integer(to_epoch_ms(window.end())),
            Value::Integer(to_epoch_ms(window.start())),
        ];

        match filter {
            OverlapFilter::Teacher(id) => {
                sql.push_str(" AND lessons.teacher_uuid = ?");
                bind_values.push(Value::Text(id.to_string()));
            }
            OverlapFilter::Student(id) => {
                sql.push_str(" AND lessons.student_uuid = ?");
                bind_values.push(Value::Text(id.to_string()));
            }
            OverlapFilter::Room(room) => {
                sql.push_str(" AND lessons.room = ?");
                bind_values.push(Value::Text(room.clone()));
            }
        }
        sql.push_str(LESSON_ORDER_SQL);

        self.query_lessons(&sql, bind_values)
    }

    fn delete_lesson(&self, id: LessonId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM lessons WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in lessons.{column}"))
    })
}

fn parse_timestamp_column(row: &Row<'_>, column: &str) -> RepoResult<chrono::NaiveDateTime> {
    let value: i64 = row.get(column)?;
    from_epoch_ms(value).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{value}` out of range in lessons.{column}"))
    })
}

fn parse_lesson_row(row: &Row<'_>) -> RepoResult<Lesson> {
    let student = match row.get::<_, Option<String>>("student_uuid")? {
        Some(text) => {
            let id = Uuid::parse_str(&text).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid uuid value `{text}` in lessons.student_uuid"
                ))
            })?;
            Some(PersonRef {
                id,
                name: row.get("student_name")?,
            })
        }
        None => None,
    };

    let lesson = Lesson {
        id: parse_uuid_column(row, "uuid")?,
        teacher: PersonRef {
            id: parse_uuid_column(row, "teacher_uuid")?,
            name: row.get("teacher_name")?,
        },
        student,
        subject: row.get("subject")?,
        room: row.get("room")?,
        start: parse_timestamp_column(row, "start_at")?,
        end: parse_timestamp_column(row, "end_at")?,
        source: LessonSource::from_db_str(&row.get::<_, String>("source_file")?),
    };
    lesson.validate()?;
    Ok(lesson)
}
