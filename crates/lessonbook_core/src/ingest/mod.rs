//! Timetable ingestion.
//!
//! # Responsibility
//! - Parse weekly timetable grids exported as CSV into lesson candidates.
//! - Persist candidates per file with failures isolated to a file or a cell.
//!
//! # Invariants
//! - A malformed cell is skipped and counted; it never aborts its file.
//! - A malformed file is skipped and reported; it never aborts the batch.
//! - Ingestion does not run the conflict checker.

pub mod cell;
pub mod import;
pub mod timetable;

pub use cell::{parse_cell, CellEntry};
pub use import::{
    import_folder, import_timetables, FileFailure, ImportOptions, ImportSummary, UploadedFile,
};
pub use timetable::{
    parse_timetable, student_from_file_name, week_start, LessonCandidate, ParsedTimetable,
    SkippedCell,
};

use crate::repo::lesson_repo::RepoError;
use chrono::NaiveTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum IngestError {
    /// File cannot be read as a timetable grid.
    ParseFailure(String),
    /// Time-of-day token is not `HH.MM` / `HH:MM`.
    MalformedTime(String),
    /// Cell range ends at or before its start.
    InvalidInterval { start: NaiveTime, end: NaiveTime },
    Io(std::io::Error),
    /// Writing a parsed file failed; the file's transaction was rolled back.
    Store(RepoError),
}

impl IngestError {
    /// Stable snake_case code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseFailure(_) => "parse_failure",
            Self::MalformedTime(_) => "malformed_time",
            Self::InvalidInterval { .. } => "invalid_interval",
            Self::Io(_) => "io",
            Self::Store(_) => "store",
        }
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailure(reason) => write!(f, "cannot parse timetable: {reason}"),
            Self::MalformedTime(value) => write!(f, "malformed time `{value}`"),
            Self::InvalidInterval { start, end } => write!(
                f,
                "time range {} - {} does not end after it starts",
                start.format("%H:%M"),
                end.format("%H:%M")
            ),
            Self::Io(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for IngestError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}
