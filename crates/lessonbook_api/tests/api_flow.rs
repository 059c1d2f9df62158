use chrono::{NaiveDate, NaiveDateTime};
use lessonbook_api::{
    ApiStatus, LessonbookApi, ManualLessonRequest, UploadFileDto, UploadRequest,
};
use lessonbook_core::intent::{IntentError, ModelClient};
use lessonbook_core::AppConfig;
use tempfile::TempDir;

const TURAN_GRID: &str = "Students schedule,,,\n\
Time:,Monday,Tuesday,Wednesday\n\
,\"Togzhan\nSummer Essay\n14.00 - 16.00\",,\"Adina\nIELTS\n09.00 - 10.30\"\n\
,,\"Assel\nSAT\n10:00 - 11:00\",\n";

struct CannedModel(&'static str);

impl ModelClient for CannedModel {
    fn generate(&self, _prompt: &str) -> Result<String, IntentError> {
        Ok(self.0.to_string())
    }
}

fn wednesday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 4)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn api(dir: &TempDir) -> LessonbookApi {
    let config = AppConfig {
        db_path: dir.path().join("lessonbook.db"),
        default_room: "Cab 3".to_string(),
        ..AppConfig::default()
    };
    LessonbookApi::new(config)
        .unwrap()
        .with_clock(wednesday_morning)
}

fn manual(teacher: &str, day_idx: i64, start_time: &str) -> ManualLessonRequest {
    ManualLessonRequest {
        teacher: teacher.to_string(),
        student: None,
        subject: None,
        room: None,
        day_idx,
        start_time: start_time.to_string(),
        duration: None,
    }
}

fn upload_turan(api: &LessonbookApi) {
    let response = api.upload(UploadRequest {
        files: vec![UploadFileDto {
            filename: "Students schedule - Turan.csv".to_string(),
            content: TURAN_GRID.to_string(),
        }],
    });
    assert_eq!(response.status, ApiStatus::Success, "{}", response.message);
    assert_eq!(response.data.unwrap()["lessons_created"], 3);
}

#[test]
fn uploaded_timetable_answers_weekly_queries() {
    let dir = TempDir::new().unwrap();
    let api = api(&dir);
    upload_turan(&api);

    let response = api.process_schedule("schedule of Turan");
    assert_eq!(response.status, ApiStatus::Success);
    assert_eq!(response.kind, Some("weekly_table"));
    assert_eq!(response.person.as_deref(), Some("Turan"));
    let slots = response.data.unwrap();
    assert_eq!(slots.as_array().unwrap().len(), 3);
    assert_eq!(slots[0]["day_idx"], 0);
    assert_eq!(slots[0]["start"], "14:00");
    assert_eq!(slots[0]["room"], "Cab 3");
}

#[test]
fn manual_lessons_are_checked_listed_and_deleted() {
    let dir = TempDir::new().unwrap();
    let api = api(&dir);
    upload_turan(&api);

    let clash = api.add_lesson_manual(&manual("Adina", 2, "09:30"));
    assert_eq!(clash.status, ApiStatus::Conflict);
    assert_eq!(clash.data.unwrap()["dimension"], "teacher");

    let added = api.add_lesson_manual(&manual("Assel", 3, "09:00"));
    assert_eq!(added.status, ApiStatus::Success, "{}", added.message);
    let lesson = added.data.unwrap();
    assert_eq!(lesson["date"], "2026-02-05");
    assert_eq!(lesson["end"], "10:00");
    assert_eq!(lesson["room"], "Cab 3");
    assert_eq!(lesson["source"], "manual");

    let thursday = api.daily_schedule(3);
    assert_eq!(thursday.data.unwrap().as_array().unwrap().len(), 1);

    let id = lesson["id"].as_str().unwrap().to_string();
    assert!(api.delete_lesson(&id).is_success());
    assert_eq!(api.delete_lesson(&id).message, "Lesson not found.");
    assert_eq!(
        api.daily_schedule(3).data.unwrap().as_array().unwrap().len(),
        0
    );
}

#[test]
fn booking_text_goes_through_the_model_fallback() {
    let dir = TempDir::new().unwrap();
    let api = api(&dir).with_model_client(CannedModel(
        r#"```json
{"intent": "BOOK", "teacher": "Assel", "student": "Karima", "subject": "SAT", "start": "2026-02-06T15:00:00", "duration": "45"}
```"#,
    ));

    let response = api.process_schedule("book Assel with Karima on Friday at 15:00");
    assert_eq!(response.status, ApiStatus::Success, "{}", response.message);
    assert_eq!(response.kind, Some("booking"));
    let lesson = response.data.unwrap();
    assert_eq!(lesson["day_idx"], 4);
    assert_eq!(lesson["end"], "15:45");
    assert_eq!(lesson["student"], "Karima");

    let again = api.process_schedule("book Assel with Karima on Friday at 15:00");
    assert_eq!(again.status, ApiStatus::Conflict);
}

#[test]
fn unreadable_upload_reports_error_status() {
    let dir = TempDir::new().unwrap();
    let api = api(&dir);
    let response = api.upload(UploadRequest {
        files: vec![UploadFileDto {
            filename: "notes.csv".to_string(),
            content: "just,some,cells\n".to_string(),
        }],
    });
    assert_eq!(response.status, ApiStatus::Error);
    assert!(response.message.starts_with("Imported 0 of 1"));
}
