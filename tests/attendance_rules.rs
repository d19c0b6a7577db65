// tests/attendance_rules.rs
mod common;

use student_automation::{
    error::AppError,
    models::{
        attendance::{
            AttendanceStatus, BulkAttendanceRequest, CreateAttendanceRequest, StudentAttendanceEntry,
            UpdateAttendanceRequest,
        },
        day::UtcDay,
    },
    services::{attendance_service, enrollment_service},
};

fn day(raw: &str) -> UtcDay {
    UtcDay::parse(raw).expect("valid day")
}

fn single(student_id: i64, course_id: i64, date: &str, status: AttendanceStatus) -> CreateAttendanceRequest {
    CreateAttendanceRequest {
        student_id,
        course_id,
        date: day(date),
        status,
        notes: None,
    }
}

fn entry(student_id: i64, status: AttendanceStatus) -> StudentAttendanceEntry {
    StudentAttendanceEntry {
        student_id,
        status,
        notes: None,
    }
}

#[tokio::test]
async fn second_single_record_for_the_same_day_conflicts() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;

    attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-02", AttendanceStatus::Present),
    )
    .await
    .unwrap();
    let again = attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-02T09:15:00Z", AttendanceStatus::Late),
    )
    .await;

    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(common::count(&pool, "attendances").await, 1);
}

#[tokio::test]
async fn client_time_zones_collapse_onto_the_utc_day() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;

    // 23:30 at UTC-3 on the 1st is the 2nd in UTC.
    let first = attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-01T23:30:00-03:00", AttendanceStatus::Present),
    )
    .await
    .unwrap();
    assert_eq!(first.date.to_string(), "2025-03-02");

    let same_day = attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-02T08:00:00+05:00", AttendanceStatus::Absent),
    )
    .await;
    assert!(matches!(same_day, Err(AppError::Conflict(_))));

    let filtered = attendance_service::course_attendance(&pool, &teacher_actor, course.id, Some(day("2025-03-02")))
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    let other_day = attendance_service::course_attendance(&pool, &teacher_actor, course.id, Some(day("2025-03-01")))
        .await
        .unwrap();
    assert!(other_day.is_empty());
}

#[tokio::test]
async fn bulk_skips_students_without_an_active_enrollment() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;

    let mut ids = Vec::new();
    for tag in ["s1", "s2", "s3", "s4", "s5"] {
        let (student, _) = common::student(&pool, &admin, tag).await;
        ids.push(student.id);
    }
    for &id in &ids[..3] {
        common::enroll(&pool, &admin, course.id, id).await;
    }
    // ids[3] was enrolled and dropped, ids[4] never enrolled.
    common::enroll(&pool, &admin, course.id, ids[3]).await;
    enrollment_service::drop_enrollment(&pool, &admin, course.id, ids[3])
        .await
        .unwrap();

    let outcome = attendance_service::record_bulk_attendance(
        &pool,
        &teacher_actor,
        BulkAttendanceRequest {
            course_id: course.id,
            date: day("2025-03-02"),
            student_attendances: ids.iter().map(|&id| entry(id, AttendanceStatus::Present)).collect(),
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.skipped_student_ids, vec![ids[3], ids[4]]);
    assert_eq!(common::count(&pool, "attendances").await, 3);
}

#[tokio::test]
async fn bulk_overwrites_an_existing_row_in_place() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;

    let original = attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-02", AttendanceStatus::Present),
    )
    .await
    .unwrap();

    let outcome = attendance_service::record_bulk_attendance(
        &pool,
        &teacher_actor,
        BulkAttendanceRequest {
            course_id: course.id,
            date: day("2025-03-02T12:00:00Z"),
            student_attendances: vec![StudentAttendanceEntry {
                student_id: student.id,
                status: AttendanceStatus::Absent,
                notes: Some("called in sick".to_string()),
            }],
        },
    )
    .await
    .unwrap();

    assert_eq!(common::count(&pool, "attendances").await, 1);
    assert_eq!(outcome.records[0].id, original.id);
    assert_eq!(outcome.records[0].status, AttendanceStatus::Absent);
    assert_eq!(outcome.records[0].notes.as_deref(), Some("called in sick"));
}

#[tokio::test]
async fn bulk_by_a_non_owner_is_forbidden() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (owner, _) = common::teacher(&pool, &admin, "owner").await;
    let (_, other_actor) = common::teacher(&pool, &admin, "other").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", owner.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;

    let denied = attendance_service::record_bulk_attendance(
        &pool,
        &other_actor,
        BulkAttendanceRequest {
            course_id: course.id,
            date: day("2025-03-02"),
            student_attendances: vec![entry(student.id, AttendanceStatus::Present)],
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert_eq!(common::count(&pool, "attendances").await, 0);
}

#[tokio::test]
async fn moving_a_record_onto_a_taken_day_conflicts() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;

    attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-02", AttendanceStatus::Present),
    )
    .await
    .unwrap();
    let later = attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-03", AttendanceStatus::Present),
    )
    .await
    .unwrap();

    let moved = attendance_service::update_attendance(
        &pool,
        &teacher_actor,
        later.id,
        UpdateAttendanceRequest {
            date: day("2025-03-02"),
            status: AttendanceStatus::Late,
            notes: None,
        },
    )
    .await;
    assert!(matches!(moved, Err(AppError::Conflict(_))));

    let kept_day = attendance_service::update_attendance(
        &pool,
        &teacher_actor,
        later.id,
        UpdateAttendanceRequest {
            date: day("2025-03-03"),
            status: AttendanceStatus::Excused,
            notes: Some("doctor".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(kept_day.status, AttendanceStatus::Excused);

    attendance_service::delete_attendance(&pool, &teacher_actor, later.id)
        .await
        .unwrap();
    assert_eq!(common::count(&pool, "attendances").await, 1);
}

#[tokio::test]
async fn students_see_only_their_own_attendance() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let (student, student_actor) = common::student(&pool, &admin, "sam").await;
    let (classmate, classmate_actor) = common::student(&pool, &admin, "kim").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;
    common::enroll(&pool, &admin, course.id, classmate.id).await;

    let record = attendance_service::record_attendance(
        &pool,
        &teacher_actor,
        single(student.id, course.id, "2025-03-02", AttendanceStatus::Present),
    )
    .await
    .unwrap();

    assert!(attendance_service::get_attendance(&pool, &student_actor, record.id).await.is_ok());
    assert!(matches!(
        attendance_service::get_attendance(&pool, &classmate_actor, record.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert_eq!(attendance_service::my_attendance(&pool, &student_actor).await.unwrap().len(), 1);
    assert!(attendance_service::my_attendance(&pool, &classmate_actor).await.unwrap().is_empty());
    assert!(matches!(
        attendance_service::list_attendance(&pool, &student_actor).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bulk_submissions_for_one_day_all_succeed() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    let mut ids = Vec::new();
    for tag in ["s1", "s2", "s3"] {
        let (student, _) = common::student(&pool, &admin, tag).await;
        common::enroll(&pool, &admin, course.id, student.id).await;
        ids.push(student.id);
    }

    for _ in 0..5 {
        let mut handles = Vec::new();
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
            AttendanceStatus::Excused,
        ] {
            let pool = pool.clone();
            let actor = teacher_actor.clone();
            let req = BulkAttendanceRequest {
                course_id: course.id,
                date: day("2025-03-02"),
                student_attendances: ids.iter().map(|id| entry(*id, status)).collect(),
            };
            handles.push(tokio::spawn(async move {
                attendance_service::record_bulk_attendance(&pool, &actor, req).await
            }));
        }
        for handle in handles {
            let outcome = handle.await.unwrap().expect("racing bulk submission succeeds");
            assert_eq!(outcome.records.len(), 3);
        }
    }
    assert_eq!(common::count(&pool, "attendances").await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_single_records_leave_one_row_and_conflict_the_rest() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, teacher_actor) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        let actor = teacher_actor.clone();
        let req = single(student.id, course.id, "2025-03-02", AttendanceStatus::Present);
        handles.push(tokio::spawn(async move {
            attendance_service::record_attendance(&pool, &actor, req).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(common::count(&pool, "attendances").await, 1);
}
