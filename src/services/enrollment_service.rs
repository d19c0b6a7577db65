// src/services/enrollment_service.rs
use crate::{
    access::Actor,
    db,
    error::{AppError, AppResult},
    models::{
        enrollment::{
            AddStudentsRequest, AddStudentsResponse, CourseEnrollmentDto, CreateEnrollmentRequest, ENROLLMENT_SELECT,
        },
        validate,
    },
    services::{course_service, student_service},
};
use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;

/// True when the student holds an `Active` enrollment in the course.
/// Accepts the pool or a transaction's connection.
pub async fn has_active_enrollment<'e, E>(executor: E, student_id: i64, course_id: i64) -> AppResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM course_enrollments WHERE student_id = ?1 AND course_id = ?2 AND status = 'Active'",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}

/// True when any enrollment row exists for the pair, whatever its status.
pub async fn has_any_enrollment<'e, E>(executor: E, student_id: i64, course_id: i64) -> AppResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM course_enrollments WHERE student_id = ?1 AND course_id = ?2")
            .bind(student_id)
            .bind(course_id)
            .fetch_one(executor)
            .await?;
    Ok(count > 0)
}

/// Ids of the students actively enrolled in a course.
pub async fn active_student_ids(conn: &mut SqliteConnection, course_id: i64) -> AppResult<BTreeSet<i64>> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT student_id FROM course_enrollments WHERE course_id = ?1 AND status = 'Active'")
            .bind(course_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(ids.into_iter().collect())
}

async fn insert_enrollment(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
    comments: Option<&str>,
) -> AppResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO course_enrollments (student_id, course_id, enrollment_date, status, comments)
        VALUES (?1, ?2, ?3, 'Active', ?4)
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(Utc::now())
    .bind(comments)
    .execute(&mut *conn)
    .await
    .map_err(db::conflict_on_unique("Student is already enrolled in this course."))?
    .last_insert_rowid();
    Ok(id)
}

pub async fn find_enrollment(db_pool: &SqlitePool, enrollment_id: i64) -> AppResult<CourseEnrollmentDto> {
    sqlx::query_as::<_, CourseEnrollmentDto>(&format!("{} WHERE ce.id = ?1", ENROLLMENT_SELECT))
        .bind(enrollment_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Enrollment not found."))
}

/// Enrolls one student. A previous row for the pair, even a dropped one, is a conflict.
pub async fn create_enrollment(
    db_pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    req: CreateEnrollmentRequest,
) -> AppResult<CourseEnrollmentDto> {
    let course = course_service::require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;
    let comments = validate::optional_text("Comments", req.comments.as_deref(), 500)?;
    student_service::require_student(db_pool, req.student_id).await?;

    if has_any_enrollment(db_pool, req.student_id, course_id).await? {
        tracing::warn!(
            "Enrollment refused: student {} already has a row for course {}.",
            req.student_id,
            course_id
        );
        return Err(AppError::conflict("Student is already enrolled in this course."));
    }

    let mut conn = db_pool.acquire().await?;
    let enrollment_id = insert_enrollment(&mut *conn, req.student_id, course_id, comments.as_deref()).await?;
    drop(conn);

    tracing::info!("📝 Student {} enrolled in course {}.", req.student_id, course_id);
    find_enrollment(db_pool, enrollment_id).await
}

/// All-or-nothing batch enrollment.
pub async fn add_students(
    db_pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    req: AddStudentsRequest,
) -> AppResult<AddStudentsResponse> {
    let course = course_service::require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;

    let student_ids: BTreeSet<i64> = req.student_ids.into_iter().collect();
    if student_ids.is_empty() {
        return Err(AppError::validation("No students selected."));
    }

    let mut tx = db::begin_write(db_pool).await?;
    for &student_id in &student_ids {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM students WHERE id = ?1")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found(format!("Student {} not found.", student_id)));
        }
        if has_any_enrollment(&mut *tx, student_id, course_id).await? {
            return Err(AppError::conflict(format!(
                "Student {} is already enrolled in this course.",
                student_id
            )));
        }
        insert_enrollment(&mut *tx, student_id, course_id, None).await?;
    }
    tx.commit().await?;

    let enrolled = student_ids.len();
    tracing::info!("📝 {} students added to course {}.", enrolled, course_id);
    Ok(AddStudentsResponse {
        message: format!("{} student(s) enrolled in {}.", enrolled, course.course_code),
        enrolled,
    })
}

/// "Removing" a student is a status transition; the row stays.
pub async fn drop_enrollment(db_pool: &SqlitePool, actor: &Actor, course_id: i64, student_id: i64) -> AppResult<()> {
    let course = course_service::require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;

    let rows_affected =
        sqlx::query("UPDATE course_enrollments SET status = 'Dropped' WHERE course_id = ?1 AND student_id = ?2")
            .bind(course_id)
            .bind(student_id)
            .execute(db_pool)
            .await?
            .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::not_found("Enrollment not found."));
    }
    tracing::info!("Student {} dropped from course {}.", student_id, course_id);
    Ok(())
}

pub async fn enrollments_for_student(
    db_pool: &SqlitePool,
    student_id: i64,
    active_only: bool,
) -> AppResult<Vec<CourseEnrollmentDto>> {
    let filter = if active_only { " AND ce.status = 'Active'" } else { "" };
    let enrollments = sqlx::query_as::<_, CourseEnrollmentDto>(&format!(
        "{} WHERE ce.student_id = ?1{} ORDER BY c.course_code ASC",
        ENROLLMENT_SELECT, filter
    ))
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(enrollments)
}

/// The caller's active enrollments.
pub async fn my_courses(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<CourseEnrollmentDto>> {
    let student_id = actor.acting_student_id()?;
    enrollments_for_student(db_pool, student_id, true).await
}
