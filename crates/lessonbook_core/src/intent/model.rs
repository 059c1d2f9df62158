//! Language-model backed resolver.
//!
//! # Responsibility
//! - Build a classification prompt with today's date and the known roster.
//! - Decode the first JSON object of the model reply into an [`Intent`].
//!
//! # Invariants
//! - Replies without a decodable JSON object are "unresolved", not errors.
//! - `role` values other than teacher/student become [`RoleFilter::Any`].

use crate::intent::keyword::Roster;
use crate::intent::{BookIntent, Intent, IntentError, IntentResolver};
use crate::model::person::RoleFilter;
use chrono::{Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"));

const START_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Text-completion capability of an external model.
pub trait ModelClient {
    fn generate(&self, prompt: &str) -> Result<String, IntentError>;
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn generate(&self, prompt: &str) -> Result<String, IntentError> {
        (**self).generate(prompt)
    }
}

pub struct ModelIntentResolver<C> {
    client: C,
    roster: Roster,
    today: Option<NaiveDate>,
}

impl<C: ModelClient> ModelIntentResolver<C> {
    pub fn new(client: C, roster: Roster) -> Self {
        Self {
            client,
            roster,
            today: None,
        }
    }

    /// Pins the date written into prompts instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn prompt(&self, text: &str) -> String {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        format!(
            "Current Date: {today}. User Input: \"{text}\"\n\
             CONTEXT: Teachers: {teachers}. Students: {students}.\n\
             RETURN JSON ONLY:\n\
             If QUERY: {{ \"intent\": \"QUERY\", \"person\": \"Name\", \"role\": \"Teacher/Student/Ambiguous\" }}\n\
             If BOOK: {{ \"intent\": \"BOOK\", \"teacher\": \"Name\", \"student\": \"Name\", \"subject\": \"Subject\", \"room\": \"Room or null\", \"start\": \"YYYY-MM-DDTHH:MM:SS\", \"duration\": 60 }}",
            today = today.format("%Y-%m-%d"),
            teachers = self.roster.teachers.join(", "),
            students = self.roster.students.join(", "),
        )
    }
}

impl<C: ModelClient> IntentResolver for ModelIntentResolver<C> {
    fn name(&self) -> &'static str {
        "model"
    }

    fn resolve(&self, text: &str) -> Result<Option<Intent>, IntentError> {
        let reply = self.client.generate(&self.prompt(text))?;
        Ok(extract_json(&reply).and_then(decode_intent))
    }
}

/// Returns the outermost `{...}` block of `text` parsed as JSON.
pub fn extract_json(text: &str) -> Option<Value> {
    let block = JSON_OBJECT_RE.find(text)?;
    serde_json::from_str(block.as_str()).ok()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIntent {
    intent: Option<String>,
    person: Option<String>,
    role: Option<String>,
    teacher: Option<String>,
    student: Option<String>,
    subject: Option<String>,
    room: Option<String>,
    start: Option<String>,
    duration: Option<Value>,
}

fn decode_intent(value: Value) -> Option<Intent> {
    let raw: RawIntent = serde_json::from_value(value).ok()?;
    match raw.intent.as_deref().map(str::trim)?.to_ascii_uppercase().as_str() {
        "QUERY" => {
            let person = non_blank(raw.person)?;
            Some(Intent::Query {
                person,
                role: RoleFilter::parse_lenient(raw.role.as_deref()),
            })
        }
        "BOOK" => Some(Intent::Book(BookIntent {
            teacher: non_blank(raw.teacher),
            student: non_blank(raw.student),
            subject: non_blank(raw.subject),
            room: non_blank(raw.room),
            start: raw.start.as_deref().and_then(parse_start),
            duration_minutes: raw.duration.as_ref().and_then(parse_duration),
        })),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && !text.eq_ignore_ascii_case("null"))
}

fn parse_start(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    START_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn parse_duration(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_json, ModelClient, ModelIntentResolver};
    use crate::intent::keyword::Roster;
    use crate::intent::{BookIntent, Intent, IntentError, IntentResolver};
    use crate::model::person::RoleFilter;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    struct CannedClient {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl CannedClient {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelClient for CannedClient {
        fn generate(&self, prompt: &str) -> Result<String, IntentError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn resolver(client: &CannedClient) -> ModelIntentResolver<&CannedClient> {
        let roster = Roster {
            teachers: vec!["Adina".to_string()],
            students: vec!["Karima".to_string()],
            ..Roster::default()
        };
        ModelIntentResolver::new(client, roster)
            .with_today(NaiveDate::from_ymd_opt(2026, 2, 4).unwrap())
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let value = extract_json("Sure!\n```json\n{\"intent\": \"QUERY\"}\n```").unwrap();
        assert_eq!(value["intent"], "QUERY");
        assert!(extract_json("no json here").is_none());
    }

    #[test]
    fn decodes_book_reply_and_writes_context_into_prompt() {
        let client = CannedClient::new(
            r#"{"intent":"BOOK","teacher":"Adina","student":"Karima","subject":"IELTS","start":"2026-02-09T09:30:00","duration":"45"}"#,
        );
        let intent = resolver(&client).resolve("book adina").unwrap();

        let start = NaiveDate::from_ymd_opt(2026, 2, 9)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(
            intent,
            Some(Intent::Book(BookIntent {
                teacher: Some("Adina".to_string()),
                student: Some("Karima".to_string()),
                subject: Some("IELTS".to_string()),
                room: None,
                start: Some(start),
                duration_minutes: Some(45),
            }))
        );

        let prompts = client.prompts.borrow();
        assert!(prompts[0].contains("Current Date: 2026-02-04"));
        assert!(prompts[0].contains("Teachers: Adina"));
    }

    #[test]
    fn ambiguous_role_becomes_any() {
        let client =
            CannedClient::new(r#"{"intent":"QUERY","person":"Diana","role":"Ambiguous"}"#);
        assert_eq!(
            resolver(&client).resolve("diana?").unwrap(),
            Some(Intent::Query {
                person: "Diana".to_string(),
                role: RoleFilter::Any,
            })
        );
    }

    #[test]
    fn unknown_intent_or_garbage_is_unresolved() {
        let client = CannedClient::new(r#"{"intent":"CHAT"}"#);
        assert_eq!(resolver(&client).resolve("hello").unwrap(), None);

        let client = CannedClient::new("{not json}");
        assert_eq!(resolver(&client).resolve("hello").unwrap(), None);
    }

    #[test]
    fn unparseable_start_is_left_empty() {
        let client = CannedClient::new(r#"{"intent":"BOOK","teacher":"Adina","start":"tomorrow"}"#);
        let Some(Intent::Book(book)) = resolver(&client).resolve("x").unwrap() else {
            panic!("expected booking intent");
        };
        assert_eq!(book.start, None);
        assert_eq!(book.duration_minutes, None);
    }
}
