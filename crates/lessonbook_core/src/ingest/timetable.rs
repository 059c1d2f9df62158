//! Weekly grid layout: header discovery, day columns and file-name metadata.

use crate::ingest::cell::{parse_cell, CellEntry};
use crate::ingest::IngestError;
use crate::model::person::normalize_student_name;
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

const HEADER_MARKER: &str = "monday";
const FILE_NAME_SEPARATOR: &str = " - ";
const CSV_EXTENSION: &str = ".csv";
const UTF8_BOM: &str = "\u{feff}";

/// One lesson read from a grid, not yet anchored to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonCandidate {
    pub weekday: Weekday,
    pub teacher: String,
    pub subject: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// A cell that looked like a lesson but could not be used.
#[derive(Debug)]
pub struct SkippedCell {
    /// Zero-based CSV record index.
    pub row: usize,
    pub column: usize,
    pub error: IngestError,
}

#[derive(Debug, Default)]
pub struct ParsedTimetable {
    /// Day column by day column, top to bottom within a column.
    pub candidates: Vec<LessonCandidate>,
    pub skipped: Vec<SkippedCell>,
}

/// Parses a CSV timetable export.
///
/// # Errors
/// - `ParseFailure` when the bytes are not UTF-8 CSV or no header row names
///   a weekday column.
pub fn parse_timetable(bytes: &[u8]) -> Result<ParsedTimetable, IngestError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| IngestError::ParseFailure("file is not valid UTF-8".to_string()))?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let rows = read_rows(text)?;
    let header_index = rows
        .iter()
        .position(|row| {
            row.iter()
                .any(|cell| cell.to_lowercase().contains(HEADER_MARKER))
        })
        .ok_or_else(|| IngestError::ParseFailure("no header row mentions Monday".to_string()))?;

    let day_columns = rows[header_index]
        .iter()
        .enumerate()
        .filter_map(|(column, label)| weekday_from_label(label).map(|day| (column, day)))
        .collect::<Vec<_>>();
    if day_columns.is_empty() {
        return Err(IngestError::ParseFailure(
            "header row has no weekday columns".to_string(),
        ));
    }

    let mut parsed = ParsedTimetable::default();
    for (column, weekday) in day_columns {
        for (row_index, row) in rows.iter().enumerate().skip(header_index + 1) {
            let Some(value) = row.get(column) else {
                continue;
            };
            match parse_cell(value) {
                Some(Ok(entry)) => parsed.candidates.push(candidate(weekday, entry)),
                Some(Err(error)) => parsed.skipped.push(SkippedCell {
                    row: row_index,
                    column,
                    error,
                }),
                None => {}
            }
        }
    }

    Ok(parsed)
}

fn read_rows(text: &str) -> Result<Vec<Vec<String>>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|result| {
            result
                .map(|record| record.iter().map(str::to_string).collect())
                .map_err(|err| IngestError::ParseFailure(format!("invalid CSV record: {err}")))
        })
        .collect()
}

/// Weekday named by the first word of a header label, e.g. `"Monday 12/02"`.
fn weekday_from_label(label: &str) -> Option<Weekday> {
    let word = label.split_whitespace().next()?.to_ascii_lowercase();
    match word.as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn candidate(weekday: Weekday, entry: CellEntry) -> LessonCandidate {
    LessonCandidate {
        weekday,
        teacher: entry.teacher,
        subject: entry.subject,
        start: entry.start,
        end: entry.end,
    }
}

/// Student named by an export file, e.g. `"Students schedule - Turan.csv"`.
///
/// Takes the second `" - "`-separated segment with the `.csv` extension
/// removed. Returns `None` when the name carries no student.
pub fn student_from_file_name(file_name: &str) -> Option<String> {
    let segment = file_name.split(FILE_NAME_SEPARATOR).nth(1)?;
    let name = segment.replace(CSV_EXTENSION, "");
    normalize_student_name(Some(&name))
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::{parse_timetable, student_from_file_name, week_start};
    use crate::ingest::IngestError;
    use chrono::{NaiveDate, Weekday};

    #[test]
    fn reads_day_columns_below_header() {
        let csv = "Student schedule,,\n\
                   Time:,Monday ,Wednesday 12.02\n\
                   ,\"Adina\nIELTS\n09.00 - 10.30\",\n\
                   ,,\"Diana\nMath\nroom 2\n14.00 - 15.00\"\n";
        let parsed = parse_timetable(csv.as_bytes()).unwrap();

        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[0].weekday, Weekday::Mon);
        assert_eq!(parsed.candidates[0].teacher, "Adina");
        assert_eq!(parsed.candidates[1].weekday, Weekday::Wed);
        assert_eq!(parsed.candidates[1].subject, "Math");
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn bad_cell_is_skipped_without_failing_file() {
        let csv = "Monday,Tuesday\n\
                   \"Adina\nIELTS\n9.00 - 1O.00\",\"Assel\nSAT\n10.00 - 11.00\"\n";
        let parsed = parse_timetable(csv.as_bytes()).unwrap();

        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].teacher, "Assel");
        assert_eq!(parsed.skipped.len(), 1);
        assert!(matches!(
            parsed.skipped[0].error,
            IngestError::MalformedTime(_)
        ));
    }

    #[test]
    fn file_without_header_is_a_parse_failure() {
        let result = parse_timetable(b"a,b\n1,2\n");
        assert!(matches!(result, Err(IngestError::ParseFailure(_))));
        let result = parse_timetable(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(IngestError::ParseFailure(_))));
    }

    #[test]
    fn student_comes_from_file_name() {
        assert_eq!(
            student_from_file_name("Students schedule new - Turan.csv").as_deref(),
            Some("Turan")
        );
        assert_eq!(student_from_file_name("timetable.csv"), None);
        assert_eq!(student_from_file_name("Schedule - Unknown.csv"), None);
    }

    #[test]
    fn week_start_is_monday() {
        let thursday = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
        let monday = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        assert_eq!(week_start(monday), monday);
    }
}
