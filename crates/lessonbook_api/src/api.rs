//! Use-case operations behind every front end.
//!
//! # Invariants
//! - Scheduling conflicts are reported as `status = "conflict"`, never as
//!   errors.
//! - Envelope messages never include internal paths or credentials.

use crate::dto::{
    LessonDto, LessonViewDto, ManualLessonRequest, UploadRequest, WeeklySlotDto,
};
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use lessonbook_core::db::open_db;
use lessonbook_core::ingest::{import_timetables, week_start, ImportOptions, UploadedFile};
use lessonbook_core::intent::gemini::GeminiClient;
use lessonbook_core::intent::keyword::KeywordIntentResolver;
use lessonbook_core::intent::{
    ChainedIntentResolver, IntentError, ModelClient, ModelIntentResolver,
    DEFAULT_DURATION_MINUTES,
};
use lessonbook_core::model::lesson::{weekday_from_index, weekday_index};
use lessonbook_core::{
    AppConfig, Assistant, AssistantReply, BookingOutcome, BookingRequest, Conflict, LessonSource,
    ScheduleError, ScheduleService,
};
use log::warn;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

const START_TIME_FORMAT: &str = "%H:%M";

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;
type SharedModelClient = Box<dyn ModelClient + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Success,
    Conflict,
    Error,
}

/// Envelope returned by every operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: ApiStatus,
    pub message: String,
    /// Payload kind: `weekly_table`, `booking`, `lesson`, `day_schedule`,
    /// `import` or `health`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Person a weekly table belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
}

impl ApiResponse {
    fn success(message: impl Into<String>, kind: &'static str, data: Value) -> Self {
        Self {
            status: ApiStatus::Success,
            message: message.into(),
            kind: Some(kind),
            data: Some(data),
            person: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            message: message.into(),
            kind: None,
            data: None,
            person: None,
        }
    }

    fn conflict(conflict: &Conflict) -> Self {
        Self {
            status: ApiStatus::Conflict,
            message: conflict.reason.clone(),
            kind: Some("conflict"),
            data: Some(json!({
                "dimension": conflict.dimension,
                "existing_lesson": conflict.existing_lesson.to_string(),
            })),
            person: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ApiStatus::Success
    }
}

/// Application context shared by all requests.
pub struct LessonbookApi {
    config: AppConfig,
    model: Option<SharedModelClient>,
    clock: Clock,
}

impl LessonbookApi {
    /// Builds the context; the model fallback is enabled when an API key is
    /// configured.
    ///
    /// # Errors
    /// - When the configured model client cannot be constructed.
    pub fn new(config: AppConfig) -> Result<Self, IntentError> {
        let model = GeminiClient::from_config(&config.model)?
            .map(|client| Box::new(client) as SharedModelClient);
        Ok(Self {
            config,
            model,
            clock: Box::new(|| Local::now().naive_local()),
        })
    }

    /// Replaces the model fallback, e.g. with an offline stub.
    pub fn with_model_client(mut self, client: impl ModelClient + Send + Sync + 'static) -> Self {
        self.model = Some(Box::new(client));
        self
    }

    /// Replaces the wall clock used for "now" and the current week.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Classifies free text and runs the lookup or booking it asks for.
    pub fn process_schedule(&self, text: &str) -> ApiResponse {
        let conn = match self.open() {
            Ok(conn) => conn,
            Err(response) => return response,
        };
        let schedule = ScheduleService::new(&conn, self.config.default_room.as_str());
        let now = (self.clock)();

        let roster = match schedule.roster(&self.config.roster) {
            Ok(roster) => roster,
            Err(err) => return schedule_error("process_schedule", &err),
        };
        let keyword = KeywordIntentResolver::new(&roster);
        let model = self
            .model
            .as_deref()
            .map(|client| ModelIntentResolver::new(client, roster.clone()).with_today(now.date()));
        let mut chain = ChainedIntentResolver::new().then(&keyword);
        if let Some(model) = model.as_ref() {
            chain = chain.then(model);
        }

        match Assistant::new(&schedule, &chain).handle(text, now) {
            Ok(AssistantReply::WeeklyTable { person, slots, .. }) => {
                let slots = slots.into_iter().map(WeeklySlotDto::from).collect::<Vec<_>>();
                let mut response = ApiResponse::success(
                    format!("Schedule: {person}"),
                    "weekly_table",
                    to_value(&slots),
                );
                response.person = Some(person);
                response
            }
            Ok(AssistantReply::Booked(lesson)) => ApiResponse::success(
                format!("Lesson booked: {}", lesson.teacher.name),
                "booking",
                to_value(&LessonDto::from(&lesson)),
            ),
            Ok(AssistantReply::Conflict(conflict)) => ApiResponse::conflict(&conflict),
            Ok(AssistantReply::Unresolved) => {
                ApiResponse::error("Could not understand the request.")
            }
            Err(err) => {
                warn!(
                    "event=api_call module=api status=error op=process_schedule error={}",
                    err
                );
                ApiResponse::error(format!("Request failed: {err}"))
            }
        }
    }

    /// Every lesson on a weekday, 0 = Monday.
    pub fn daily_schedule(&self, day_idx: i64) -> ApiResponse {
        let Some(weekday) = u8::try_from(day_idx).ok().and_then(weekday_from_index) else {
            return ApiResponse::error("day_idx must be between 0 and 6.");
        };
        let conn = match self.open() {
            Ok(conn) => conn,
            Err(response) => return response,
        };
        let schedule = ScheduleService::new(&conn, self.config.default_room.as_str());

        match schedule.day_schedule(weekday) {
            Ok(lessons) => {
                let lessons = lessons
                    .into_iter()
                    .map(LessonViewDto::from)
                    .collect::<Vec<_>>();
                ApiResponse::success(
                    format!("{} lesson(s).", lessons.len()),
                    "day_schedule",
                    to_value(&lessons),
                )
            }
            Err(err) => schedule_error("daily_schedule", &err),
        }
    }

    /// Books a lesson on a day of the current week with the full
    /// teacher, student and room check.
    pub fn add_lesson_manual(&self, request: &ManualLessonRequest) -> ApiResponse {
        let Some(weekday) = u8::try_from(request.day_idx)
            .ok()
            .and_then(weekday_from_index)
        else {
            return ApiResponse::error("day_idx must be between 0 and 6.");
        };
        let Ok(start_time) =
            NaiveTime::parse_from_str(request.start_time.trim(), START_TIME_FORMAT)
        else {
            return ApiResponse::error("start_time must be HH:MM.");
        };
        let monday = week_start((self.clock)().date());
        let Some(date) = monday.checked_add_days(Days::new(u64::from(weekday_index(weekday))))
        else {
            return ApiResponse::error("Lesson date is out of range.");
        };

        let room = request
            .room
            .as_deref()
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .unwrap_or(self.config.default_room.as_str())
            .to_string();
        let booking = BookingRequest {
            teacher: request.teacher.clone(),
            student: request.student.clone(),
            subject: request.subject.clone(),
            room: Some(room),
            start: date.and_time(start_time),
            duration_minutes: request.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
            source: LessonSource::Manual,
        };

        let conn = match self.open() {
            Ok(conn) => conn,
            Err(response) => return response,
        };
        let schedule = ScheduleService::new(&conn, self.config.default_room.as_str());
        match schedule.book_lesson(&booking) {
            Ok(BookingOutcome::Booked(lesson)) => ApiResponse::success(
                "Lesson added.",
                "lesson",
                to_value(&LessonDto::from(&lesson)),
            ),
            Ok(BookingOutcome::Conflict(conflict)) => ApiResponse::conflict(&conflict),
            Err(err) => schedule_error("add_lesson_manual", &err),
        }
    }

    pub fn delete_lesson(&self, id: &str) -> ApiResponse {
        let Ok(id) = Uuid::parse_str(id.trim()) else {
            return ApiResponse::error("Invalid lesson id.");
        };
        let conn = match self.open() {
            Ok(conn) => conn,
            Err(response) => return response,
        };
        let schedule = ScheduleService::new(&conn, self.config.default_room.as_str());

        match schedule.delete_lesson(id) {
            Ok(()) => ApiResponse {
                status: ApiStatus::Success,
                message: "Lesson deleted.".to_string(),
                kind: None,
                data: None,
                person: None,
            },
            Err(ScheduleError::LessonNotFound(_)) => ApiResponse::error("Lesson not found."),
            Err(err) => schedule_error("delete_lesson", &err),
        }
    }

    /// Imports uploaded timetable exports into the current week.
    pub fn upload(&self, request: UploadRequest) -> ApiResponse {
        if request.files.is_empty() {
            return ApiResponse::error("No files uploaded.");
        }
        let files = request
            .files
            .into_iter()
            .map(|file| UploadedFile {
                file_name: file.filename,
                content: file.content.into_bytes(),
            })
            .collect::<Vec<_>>();
        let conn = match self.open() {
            Ok(conn) => conn,
            Err(response) => return response,
        };
        let options = ImportOptions {
            default_room: self.config.default_room.clone(),
            week_start: week_start((self.clock)().date()),
        };

        let summary = import_timetables(&conn, &files, &options);
        let message = format!(
            "Imported {} of {} file(s), {} lesson(s).",
            summary.files_imported, summary.files_total, summary.lessons_created
        );
        let status = if summary.files_imported == 0 {
            ApiStatus::Error
        } else {
            ApiStatus::Success
        };
        ApiResponse {
            status,
            message,
            kind: Some("import"),
            data: Some(to_value(&summary)),
            person: None,
        }
    }

    pub fn health(&self) -> ApiResponse {
        ApiResponse::success(
            "ok",
            "health",
            json!({
                "version": lessonbook_core::core_version(),
                "db_path": self.config.db_path.display().to_string(),
                "model_fallback": self.model.is_some(),
            }),
        )
    }

    fn open(&self) -> Result<Connection, ApiResponse> {
        open_db(&self.config.db_path).map_err(|err| {
            warn!(
                "event=api_call module=api status=error op=open_db error={}",
                err
            );
            ApiResponse::error("Database is unavailable.")
        })
    }
}

fn schedule_error(op: &str, err: &ScheduleError) -> ApiResponse {
    match err {
        ScheduleError::InvalidRequest(_) => ApiResponse::error(err.to_string()),
        ScheduleError::LessonNotFound(_) => ApiResponse::error("Lesson not found."),
        ScheduleError::Repo(_) => {
            warn!(
                "event=api_call module=api status=error op={} error={}",
                op, err
            );
            ApiResponse::error("Storage error.")
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::{ApiResponse, ApiStatus, LessonbookApi};
    use lessonbook_core::AppConfig;
    use serde_json::json;

    #[test]
    fn envelope_omits_empty_fields() {
        let rendered = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(rendered, json!({"status": "error", "message": "nope"}));
    }

    #[test]
    fn success_envelope_names_payload_type() {
        let rendered =
            serde_json::to_value(ApiResponse::success("ok", "health", json!({}))).unwrap();
        assert_eq!(rendered["status"], "success");
        assert_eq!(rendered["type"], "health");
    }

    #[test]
    fn invalid_inputs_are_rejected_before_touching_storage() {
        let config = AppConfig {
            db_path: "/nonexistent-dir/lessonbook.db".into(),
            ..AppConfig::default()
        };
        let api = LessonbookApi::new(config).unwrap();
        assert_eq!(api.daily_schedule(7).status, ApiStatus::Error);
        assert_eq!(api.daily_schedule(-1).status, ApiStatus::Error);
        assert_eq!(api.delete_lesson("42").message, "Invalid lesson id.");
    }

    #[test]
    fn health_reports_disabled_model_without_key() {
        let api = LessonbookApi::new(AppConfig::default()).unwrap();
        let response = api.health();
        assert!(response.is_success());
        assert_eq!(response.data.unwrap()["model_fallback"], false);
    }
}
