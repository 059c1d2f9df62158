use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use lessonbook_core::db::open_db_in_memory;
use lessonbook_core::{
    BookingOutcome, BookingRequest, LessonSource, RoleFilter, ScheduleService,
};

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn add(
    service: &ScheduleService<'_>,
    teacher: &str,
    student: &str,
    subject: &str,
    room: &str,
    start: NaiveDateTime,
) {
    let outcome = service
        .book_lesson(&BookingRequest {
            teacher: teacher.to_string(),
            student: Some(student.to_string()),
            subject: Some(subject.to_string()),
            room: Some(room.to_string()),
            start,
            duration_minutes: 60,
            source: LessonSource::Manual,
        })
        .unwrap();
    assert!(matches!(outcome, BookingOutcome::Booked(_)));
}

#[test]
fn repeated_weeks_collapse_to_one_slot() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    // Mondays 2, 9 and 16 February at 09:00.
    for day in [2, 9, 16] {
        add(&service, "Adina", "Madina", "IELTS", "Cab 1", at(day, 9, 0));
    }

    let slots = service.weekly_slots("Adina", RoleFilter::Teacher).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].weekday, Weekday::Mon);
    assert_eq!(slots[0].start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(slots[0].room, "Cab 1");
}

#[test]
fn different_start_times_are_separate_slots() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    add(&service, "Adina", "Madina", "IELTS", "Cab 1", at(2, 9, 0));
    add(&service, "Adina", "Karima", "SAT", "Cab 2", at(2, 11, 0));

    let slots = service.weekly_slots("Adina", RoleFilter::Any).unwrap();
    assert_eq!(slots.len(), 2);
}

#[test]
fn same_slot_with_other_subject_is_still_one_slot() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    add(&service, "Adina", "Madina", "IELTS", "Cab 1", at(2, 9, 0));
    add(&service, "Adina", "Madina", "Essay", "Cab 1", at(9, 9, 0));

    let slots = service.weekly_slots("adina", RoleFilter::Teacher).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].subject, "IELTS");
}

#[test]
fn role_filter_restricts_matched_field() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    add(&service, "Adina", "Madina", "IELTS", "Cab 1", at(2, 9, 0));

    assert!(service
        .weekly_slots("Madina", RoleFilter::Teacher)
        .unwrap()
        .is_empty());
    assert_eq!(
        service
            .weekly_slots("Madina", RoleFilter::Student)
            .unwrap()
            .len(),
        1
    );
    // "adina" is also a substring of "Madina", so Any matches both fields.
    assert_eq!(
        service.weekly_slots("adina", RoleFilter::Any).unwrap().len(),
        1
    );
}

#[test]
fn substring_lookup_folds_cyrillic_case() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    add(&service, "Адина", "Мадина", "IELTS", "Cab 1", at(3, 15, 0));

    let slots = service.weekly_slots("адин", RoleFilter::Teacher).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].weekday, Weekday::Tue);
}

#[test]
fn day_schedule_keeps_every_occurrence() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    for day in [2, 9] {
        add(&service, "Adina", "Madina", "IELTS", "Cab 1", at(day, 9, 0));
    }
    add(&service, "Assel", "Karima", "SAT", "Cab 2", at(3, 9, 0));

    let monday = service.day_schedule(Weekday::Mon).unwrap();
    assert_eq!(monday.len(), 2);
    assert!(monday.iter().all(|view| view.teacher == "Adina"));
    assert!(service.day_schedule(Weekday::Sun).unwrap().is_empty());
}

#[test]
fn day_schedule_uses_wall_clock_weekday_at_day_edges() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(&conn, "Cab 1");
    // 31 January 2026 is a Saturday, 1 February a Sunday.
    let saturday_late = NaiveDate::from_ymd_opt(2026, 1, 31)
        .unwrap()
        .and_hms_opt(22, 30, 0)
        .unwrap();
    add(&service, "Adina", "Madina", "IELTS", "Cab 1", saturday_late);
    add(&service, "Assel", "Karima", "SAT", "Cab 2", at(1, 23, 0));
    add(&service, "Togzhan", "Turan", "Essay", "Cab 3", at(2, 0, 0));

    let saturday = service.day_schedule(Weekday::Sat).unwrap();
    assert_eq!(saturday.len(), 1);
    assert_eq!(saturday[0].teacher, "Adina");

    let sunday = service.day_schedule(Weekday::Sun).unwrap();
    assert_eq!(sunday.len(), 1);
    assert_eq!(sunday[0].start, NaiveTime::from_hms_opt(23, 0, 0).unwrap());

    let monday = service.day_schedule(Weekday::Mon).unwrap();
    assert_eq!(monday.len(), 1);
    assert_eq!(monday[0].teacher, "Togzhan");
}
