//! Single grid cell parsing.
//!
//! A lesson cell holds non-empty lines `teacher`, `subject`, optional notes and
//! a final time range such as `14.00 - 16.00` or `14:00-16:00`.

use crate::ingest::IngestError;
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

static RANGE_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[-–]\s*").expect("valid range separator regex"));
static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[.:](\d{1,2})$").expect("valid time regex"));

const MIN_CELL_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEntry {
    pub teacher: String,
    pub subject: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Parses one cell.
///
/// Returns `None` for cells that do not look like a lesson (too few lines, or
/// a last line that is not a two-part range) and `Some(Err(_))` for lesson
/// cells whose times are unusable.
pub fn parse_cell(value: &str) -> Option<Result<CellEntry, IngestError>> {
    let lines = value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    if lines.len() < MIN_CELL_LINES {
        return None;
    }

    let range = RANGE_SEPARATOR_RE.split(lines[lines.len() - 1]).collect::<Vec<_>>();
    let [start, end] = range.as_slice() else {
        return None;
    };

    Some(parse_range(start, end).map(|(start, end)| CellEntry {
        teacher: lines[0].to_string(),
        subject: lines[1].to_string(),
        start,
        end,
    }))
}

fn parse_range(start: &str, end: &str) -> Result<(NaiveTime, NaiveTime), IngestError> {
    let start = parse_time_of_day(start)?;
    let end = parse_time_of_day(end)?;
    if end <= start {
        return Err(IngestError::InvalidInterval { start, end });
    }
    Ok((start, end))
}

/// Parses `H.MM`, `HH.MM`, `H:MM` or `HH:MM`.
pub fn parse_time_of_day(token: &str) -> Result<NaiveTime, IngestError> {
    let token = token.trim();
    let malformed = || IngestError::MalformedTime(token.to_string());
    let captures = TIME_OF_DAY_RE.captures(token).ok_or_else(malformed)?;
    let hour = captures[1].parse::<u32>().map_err(|_| malformed())?;
    let minute = captures[2].parse::<u32>().map_err(|_| malformed())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::{parse_cell, parse_time_of_day};
    use crate::ingest::IngestError;
    use chrono::NaiveTime;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn parses_dotted_range_with_notes() {
        let entry = parse_cell("Togzhan\nSummer Essay\n online \n14.00 - 16.00")
            .unwrap()
            .unwrap();
        assert_eq!(entry.teacher, "Togzhan");
        assert_eq!(entry.subject, "Summer Essay");
        assert_eq!(entry.start, time(14, 0));
        assert_eq!(entry.end, time(16, 0));
    }

    #[test]
    fn accepts_colon_and_tight_separator() {
        let entry = parse_cell("Adina\nIELTS\n9:30-10:45").unwrap().unwrap();
        assert_eq!(entry.start, time(9, 30));
        assert_eq!(entry.end, time(10, 45));
    }

    #[test]
    fn short_or_rangeless_cells_are_not_lessons() {
        assert!(parse_cell("").is_none());
        assert!(parse_cell("Adina\n14.00 - 15.00").is_none());
        assert!(parse_cell("Adina\nIELTS\nsee chat").is_none());
    }

    #[test]
    fn bad_times_are_reported() {
        assert!(matches!(
            parse_cell("Adina\nIELTS\n25.00 - 26.00"),
            Some(Err(IngestError::MalformedTime(_)))
        ));
        assert!(matches!(
            parse_cell("Adina\nIELTS\nnoon - 13.00"),
            Some(Err(IngestError::MalformedTime(_)))
        ));
        assert!(matches!(
            parse_cell("Adina\nIELTS\n15.00 - 14.00"),
            Some(Err(IngestError::InvalidInterval { .. }))
        ));
    }

    #[test]
    fn single_digit_minutes_are_read_as_written() {
        assert_eq!(parse_time_of_day(" 08.05 ").unwrap(), time(8, 5));
        assert_eq!(parse_time_of_day("9.5").unwrap(), time(9, 5));
        assert!(parse_time_of_day("9.").is_err());
        assert!(parse_time_of_day("9.60").is_err());
        assert!(parse_time_of_day("9.055").is_err());
    }

    #[test]
    fn range_with_short_minutes_parses() {
        let entry = parse_cell("Assel\nSAT\n9.5 - 10.30").unwrap().unwrap();
        assert_eq!(entry.start, time(9, 5));
        assert_eq!(entry.end, time(10, 30));
    }
}
