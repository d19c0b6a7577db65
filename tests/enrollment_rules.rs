// tests/enrollment_rules.rs
mod common;

use student_automation::{
    error::AppError,
    models::enrollment::{AddStudentsRequest, CreateEnrollmentRequest, EnrollmentStatus},
    services::{course_service, enrollment_service},
};

#[tokio::test]
async fn re_enrolling_after_drop_is_a_conflict() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;

    common::enroll(&pool, &admin, course.id, student.id).await;
    enrollment_service::drop_enrollment(&pool, &admin, course.id, student.id)
        .await
        .unwrap();

    let again = enrollment_service::create_enrollment(
        &pool,
        &admin,
        course.id,
        CreateEnrollmentRequest {
            student_id: student.id,
            comments: None,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(common::count(&pool, "course_enrollments").await, 1);

    let roster = course_service::course_students(&pool, &admin, course.id).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].enrollment_status, EnrollmentStatus::Dropped);
}

#[tokio::test]
async fn owner_may_enroll_but_other_teacher_may_not() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (owner, owner_actor) = common::teacher(&pool, &admin, "owner").await;
    let (_, other_actor) = common::teacher(&pool, &admin, "other").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "CHEM1", owner.id).await;

    let req = || CreateEnrollmentRequest {
        student_id: student.id,
        comments: Some("late add".to_string()),
    };
    let denied = enrollment_service::create_enrollment(&pool, &other_actor, course.id, req()).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let enrollment = enrollment_service::create_enrollment(&pool, &owner_actor, course.id, req())
        .await
        .unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert_eq!(enrollment.comments.as_deref(), Some("late add"));
}

#[tokio::test]
async fn add_students_is_all_or_nothing() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let (first, _) = common::student(&pool, &admin, "first").await;
    let (second, _) = common::student(&pool, &admin, "second").await;
    let course = common::course(&pool, &admin, "MATH2", teacher.id).await;
    common::enroll(&pool, &admin, course.id, first.id).await;

    let conflict = enrollment_service::add_students(
        &pool,
        &admin,
        course.id,
        AddStudentsRequest {
            student_ids: vec![second.id, first.id],
        },
    )
    .await;
    assert!(matches!(conflict, Err(AppError::Conflict(_))));

    let unknown = enrollment_service::add_students(
        &pool,
        &admin,
        course.id,
        AddStudentsRequest {
            student_ids: vec![second.id, 9_999],
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
    assert_eq!(common::count(&pool, "course_enrollments").await, 1);

    let empty = enrollment_service::add_students(&pool, &admin, course.id, AddStudentsRequest { student_ids: vec![] }).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let added = enrollment_service::add_students(
        &pool,
        &admin,
        course.id,
        AddStudentsRequest {
            student_ids: vec![second.id],
        },
    )
    .await
    .unwrap();
    assert_eq!(added.enrolled, 1);
    assert_eq!(common::count(&pool, "course_enrollments").await, 2);
}

#[tokio::test]
async fn available_students_excludes_any_existing_row() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let (dropped, _) = common::student(&pool, &admin, "dropped").await;
    let (free, _) = common::student(&pool, &admin, "free").await;
    let course = common::course(&pool, &admin, "HIST1", teacher.id).await;

    common::enroll(&pool, &admin, course.id, dropped.id).await;
    enrollment_service::drop_enrollment(&pool, &admin, course.id, dropped.id)
        .await
        .unwrap();

    let available = course_service::available_students(&pool, &admin, course.id).await.unwrap();
    let ids: Vec<i64> = available.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![free.id]);
}

#[tokio::test]
async fn my_courses_lists_only_active_enrollments() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let (student, student_actor) = common::student(&pool, &admin, "sam").await;
    let kept = common::course(&pool, &admin, "ART1", teacher.id).await;
    let left = common::course(&pool, &admin, "ART2", teacher.id).await;
    common::enroll(&pool, &admin, kept.id, student.id).await;
    common::enroll(&pool, &admin, left.id, student.id).await;
    enrollment_service::drop_enrollment(&pool, &admin, left.id, student.id)
        .await
        .unwrap();

    let mine = enrollment_service::my_courses(&pool, &student_actor).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].course_code, "ART1");

    let refreshed = course_service::require_course(&pool, left.id).await.unwrap();
    assert_eq!(refreshed.enrolled_students_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_batch_enrollments_enroll_once() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course_id = common::course(&pool, &admin, "BIO101", teacher.id).await.id;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        let admin = admin.clone();
        let req = AddStudentsRequest {
            student_ids: vec![student.id],
        };
        handles.push(tokio::spawn(async move {
            enrollment_service::add_students(&pool, &admin, course_id, req).await
        }));
    }

    let mut enrolled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => enrolled += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(enrolled, 1);
    assert_eq!(common::count(&pool, "course_enrollments").await, 1);
}
