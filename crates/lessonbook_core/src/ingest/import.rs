//! Persisting parsed timetables.

use crate::ingest::timetable::{
    parse_timetable, student_from_file_name, week_start, LessonCandidate,
};
use crate::ingest::IngestError;
use crate::model::lesson::{weekday_index, Lesson, LessonSource};
use crate::model::person::{Person, PersonRef, PersonRole};
use crate::repo::lesson_repo::{LessonRepository, RepoError, SqliteLessonRepository};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use chrono::{Days, Local, NaiveDate};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

const CSV_EXTENSION: &str = "csv";

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub default_room: String,
    /// Monday that weekday columns are anchored to.
    pub week_start: NaiveDate,
}

impl ImportOptions {
    /// Anchors lessons to the current local week.
    pub fn current_week(default_room: impl Into<String>) -> Self {
        Self {
            default_room: default_room.into(),
            week_start: week_start(Local::now().date_naive()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub files_total: usize,
    pub files_imported: usize,
    pub lessons_created: usize,
    pub cells_skipped: usize,
    pub failures: Vec<FileFailure>,
}

/// Imports every file independently; one file's failure never affects others.
///
/// Each file is written in its own transaction, so a failed file leaves no
/// partial rows behind.
pub fn import_timetables(
    conn: &Connection,
    files: &[UploadedFile],
    options: &ImportOptions,
) -> ImportSummary {
    let started_at = Instant::now();
    let mut summary = ImportSummary {
        files_total: files.len(),
        ..ImportSummary::default()
    };
    info!(
        "event=timetable_import module=ingest status=start files={}",
        files.len()
    );

    for (file_index, file) in files.iter().enumerate() {
        match import_one(conn, file, options) {
            Ok((created, skipped)) => {
                summary.files_imported += 1;
                summary.lessons_created += created;
                summary.cells_skipped += skipped;
                info!(
                    "event=timetable_import module=ingest status=ok file_index={} lessons={} cells_skipped={}",
                    file_index, created, skipped
                );
            }
            Err(err) => {
                warn!(
                    "event=timetable_import module=ingest status=skip file_index={} error_code={}",
                    file_index,
                    err.code()
                );
                summary.failures.push(FileFailure {
                    file_name: file.file_name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        "event=timetable_import module=ingest status=ok files={} imported={} lessons={} cells_skipped={} duration_ms={}",
        summary.files_total,
        summary.files_imported,
        summary.lessons_created,
        summary.cells_skipped,
        started_at.elapsed().as_millis()
    );
    summary
}

/// Imports every `*.csv` file of `dir` in file-name order.
///
/// # Errors
/// - `Io` when the directory itself cannot be listed. Unreadable files are
///   reported in the summary instead.
pub fn import_folder(
    conn: &Connection,
    dir: &Path,
    options: &ImportOptions,
) -> Result<ImportSummary, IngestError> {
    let mut paths = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && has_csv_extension(path))
        .collect::<Vec<_>>();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::read(&path) {
            Ok(content) => files.push(UploadedFile { file_name, content }),
            Err(err) => unreadable.push(FileFailure {
                file_name,
                reason: err.to_string(),
            }),
        }
    }

    let mut summary = import_timetables(conn, &files, options);
    summary.files_total += unreadable.len();
    summary.failures.extend(unreadable);
    Ok(summary)
}

/// Returns `(lessons created, cells skipped)`.
fn import_one(
    conn: &Connection,
    file: &UploadedFile,
    options: &ImportOptions,
) -> Result<(usize, usize), IngestError> {
    if !has_csv_extension(Path::new(&file.file_name)) {
        return Err(IngestError::ParseFailure("not a CSV file".to_string()));
    }

    let parsed = parse_timetable(&file.content)?;
    for skipped in &parsed.skipped {
        info!(
            "event=timetable_cell_skip module=ingest status=skip row={} column={} error_code={}",
            skipped.row,
            skipped.column,
            skipped.error.code()
        );
    }

    let student_name = student_from_file_name(&file.file_name);
    let write = || -> Result<usize, RepoError> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let people = SqlitePersonRepository::new(&tx);
        let lessons = SqliteLessonRepository::new(&tx);

        let student = match student_name.as_deref() {
            Some(name) => Some(people.ensure_person(name, PersonRole::Student)?),
            None => None,
        };
        for candidate in &parsed.candidates {
            let teacher = people.ensure_person(&candidate.teacher, PersonRole::Teacher)?;
            let lesson = to_lesson(candidate, &teacher, student.as_ref(), file, options)?;
            lessons.create_lesson(&lesson)?;
        }

        tx.commit()?;
        Ok(parsed.candidates.len())
    };

    let created = write()?;
    Ok((created, parsed.skipped.len()))
}

fn to_lesson(
    candidate: &LessonCandidate,
    teacher: &Person,
    student: Option<&Person>,
    file: &UploadedFile,
    options: &ImportOptions,
) -> Result<Lesson, RepoError> {
    let date = options
        .week_start
        .checked_add_days(Days::new(u64::from(weekday_index(candidate.weekday))))
        .ok_or_else(|| RepoError::InvalidData("lesson date out of range".to_string()))?;

    Ok(Lesson {
        id: Uuid::new_v4(),
        teacher: PersonRef::from(teacher),
        student: student.map(PersonRef::from),
        subject: candidate.subject.clone(),
        room: options.default_room.clone(),
        start: date.and_time(candidate.start),
        end: date.and_time(candidate.end),
        source: LessonSource::Upload(file.file_name.clone()),
    })
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(CSV_EXTENSION))
}
