//! Person domain model.
//!
//! # Invariants
//! - Names are stored trimmed with inner whitespace collapsed.
//! - `(role, name)` is unique ignoring case, Cyrillic included; see
//!   [`person_name_key`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PersonId = Uuid;

/// Placeholder spellings that never identify a real student.
const STUDENT_PLACEHOLDERS: &[&str] = &["unknown"];
/// Placeholder spellings used when a booking has no teacher yet.
const TEACHER_PLACEHOLDERS: &[&str] = &["tbd", "unknown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Teacher,
    Student,
}

impl PersonRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub role: PersonRole,
}

impl Person {
    /// Creates a person with a fresh id. `name` is expected to be normalized.
    pub fn new(name: impl Into<String>, role: PersonRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
        }
    }
}

/// Which name field a lookup matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFilter {
    Teacher,
    Student,
    /// Either the teacher or the student field.
    #[default]
    Any,
}

impl RoleFilter {
    /// Lenient parse used for resolver output; anything unrecognized is `Any`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("teacher") => Self::Teacher,
            Some("student") => Self::Student,
            _ => Self::Any,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Any => "any",
        }
    }
}

impl From<PersonRole> for RoleFilter {
    fn from(value: PersonRole) -> Self {
        match value {
            PersonRole::Teacher => Self::Teacher,
            PersonRole::Student => Self::Student,
        }
    }
}

/// Lightweight `(id, name)` reference embedded in lesson read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: PersonId,
    pub name: String,
}

impl From<&Person> for PersonRef {
    fn from(value: &Person) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
        }
    }
}

/// Trims and collapses whitespace. Returns `None` for blank input.
pub fn normalize_person_name(raw: &str) -> Option<String> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!normalized.is_empty()).then_some(normalized)
}

/// Identity key for a person name: normalized and Unicode lower-cased.
pub fn person_name_key(raw: &str) -> Option<String> {
    normalize_person_name(raw).map(|name| name.to_lowercase())
}

/// Returns whether two names identify the same person within a role.
pub fn same_person_name(left: &str, right: &str) -> bool {
    match (person_name_key(left), person_name_key(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Normalizes an optional student name, mapping blanks and `unknown` to `None`.
pub fn normalize_student_name(raw: Option<&str>) -> Option<String> {
    let name = normalize_person_name(raw?)?;
    if is_placeholder(&name, STUDENT_PLACEHOLDERS) {
        return None;
    }
    Some(name)
}

/// Returns whether a teacher name is a placeholder such as `TBD`.
pub fn is_placeholder_teacher(name: &str) -> bool {
    is_placeholder(name.trim(), TEACHER_PLACEHOLDERS)
}

fn is_placeholder(name: &str, placeholders: &[&str]) -> bool {
    placeholders
        .iter()
        .any(|placeholder| name.eq_ignore_ascii_case(placeholder))
}
