//! Core domain logic for lessonbook.
//! This crate is the single source of truth for scheduling invariants.

pub mod config;
pub mod db;
pub mod ingest;
pub mod intent;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::lesson::{Lesson, LessonId, LessonSource, LessonValidationError, DEFAULT_ROOM};
pub use model::person::{Person, PersonId, PersonRole, RoleFilter};
pub use model::window::TimeWindow;
pub use repo::lesson_repo::{
    LessonListQuery, LessonRepository, OverlapFilter, RepoError, RepoResult,
    SqliteLessonRepository,
};
pub use repo::person_repo::{PersonRepository, SqlitePersonRepository};
pub use schedule::conflict::{check_conflict, Conflict, ConflictDimension, ConflictProbe};
pub use schedule::day::{day_schedule, LessonView};
pub use schedule::slots::{dedup_weekly_slots, weekly_slots, WeeklySlot};
pub use service::{
    Assistant, AssistantError, AssistantReply, BookingOutcome, BookingRequest, ScheduleError,
    ScheduleService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
