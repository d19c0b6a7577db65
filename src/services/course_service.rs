// src/services/course_service.rs
use crate::{
    access::Actor,
    db,
    error::{AppError, AppResult},
    models::{
        course::{
            CourseDto, CourseStudentDto, CreateCourseRequest, UpdateCourseRequest, COURSE_SELECT, MAX_CREDITS,
        },
        student::{StudentDto, STUDENT_SELECT},
        validate,
    },
    services::teacher_service,
};
use chrono::Utc;
use sqlx::SqlitePool;

const MAX_CODE_LEN: usize = 20;
const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

fn validate_credits(credits: i64) -> AppResult<i64> {
    if (0..=MAX_CREDITS).contains(&credits) {
        Ok(credits)
    } else {
        Err(AppError::validation(format!("Credits must be between 0 and {}.", MAX_CREDITS)))
    }
}

pub async fn find_course(db_pool: &SqlitePool, course_id: i64) -> AppResult<Option<CourseDto>> {
    let course = sqlx::query_as::<_, CourseDto>(&format!("{} WHERE c.id = ?1", COURSE_SELECT))
        .bind(course_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(course)
}

pub async fn require_course(db_pool: &SqlitePool, course_id: i64) -> AppResult<CourseDto> {
    find_course(db_pool, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found."))
}

/// Every course; open to any authenticated user.
pub async fn list_courses(db_pool: &SqlitePool) -> AppResult<Vec<CourseDto>> {
    let courses = sqlx::query_as::<_, CourseDto>(&format!("{} ORDER BY c.course_code ASC", COURSE_SELECT))
        .fetch_all(db_pool)
        .await?;
    Ok(courses)
}

pub async fn courses_for_teacher(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<Vec<CourseDto>> {
    let courses = sqlx::query_as::<_, CourseDto>(&format!(
        "{} WHERE c.teacher_id = ?1 ORDER BY c.course_code ASC",
        COURSE_SELECT
    ))
    .bind(teacher_id)
    .fetch_all(db_pool)
    .await?;
    Ok(courses)
}

pub async fn my_teacher_courses(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<CourseDto>> {
    let teacher_id = actor.acting_teacher_id()?;
    courses_for_teacher(db_pool, teacher_id).await
}

pub async fn create_course(db_pool: &SqlitePool, actor: &Actor, req: CreateCourseRequest) -> AppResult<CourseDto> {
    actor.require_admin()?;
    let course_code = validate::required_text("Course code", &req.course_code, MAX_CODE_LEN)?;
    let course_name = validate::required_text("Course name", &req.course_name, MAX_NAME_LEN)?;
    let description = validate::optional_text("Description", req.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    let credits = validate_credits(req.credits)?;

    if teacher_service::find_teacher(db_pool, req.teacher_id).await?.is_none() {
        return Err(AppError::not_found("Teacher not found."));
    }

    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE course_code = ?1")
        .bind(&course_code)
        .fetch_one(db_pool)
        .await?;
    if taken > 0 {
        return Err(AppError::conflict("Course code already exists."));
    }

    let now = Utc::now();
    let course_id = sqlx::query(
        r#"
        INSERT INTO courses (course_code, course_name, description, credits, teacher_id, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 'NotStarted', ?6, ?6)
        "#,
    )
    .bind(&course_code)
    .bind(&course_name)
    .bind(description)
    .bind(credits)
    .bind(req.teacher_id)
    .bind(now)
    .execute(db_pool)
    .await
    .map_err(db::conflict_on_unique("Course code already exists."))?
    .last_insert_rowid();

    tracing::info!("📚 Course {} '{}' created (id {}).", course_code, course_name, course_id);
    require_course(db_pool, course_id).await
}

/// Admin or the owning teacher may edit name, description, credits and status.
pub async fn update_course(
    db_pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    req: UpdateCourseRequest,
) -> AppResult<CourseDto> {
    let course = require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;
    let course_name = validate::required_text("Course name", &req.course_name, MAX_NAME_LEN)?;
    let description = validate::optional_text("Description", req.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    let credits = validate_credits(req.credits)?;

    sqlx::query(
        r#"
        UPDATE courses
        SET course_name = ?1, description = ?2, credits = ?3, status = ?4, updated_at = ?5
        WHERE id = ?6
        "#,
    )
    .bind(course_name)
    .bind(description)
    .bind(credits)
    .bind(req.status)
    .bind(Utc::now())
    .bind(course_id)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Course {} updated by {}.", course_id, actor.user_id);
    require_course(db_pool, course_id).await
}

/// Hard delete; enrollments, grades and attendance go with it.
pub async fn delete_course(db_pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<()> {
    actor.require_admin()?;
    let rows_affected = sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(course_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::not_found("Course not found."));
    }
    tracing::info!("🗑️ Course {} deleted.", course_id);
    Ok(())
}

/// Roster with every enrollment status.
pub async fn course_students(db_pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Vec<CourseStudentDto>> {
    let course = require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;

    let roster = sqlx::query_as::<_, CourseStudentDto>(
        r#"
        SELECT
            s.id, s.student_number, u.first_name, u.last_name, u.email,
            ce.enrollment_date, ce.status AS enrollment_status,
            c.id AS course_id, c.course_name, c.course_code
        FROM course_enrollments ce
        JOIN students s ON s.id = ce.student_id
        JOIN users u ON u.id = s.user_id
        JOIN courses c ON c.id = ce.course_id
        WHERE ce.course_id = ?1
        ORDER BY u.last_name ASC, u.first_name ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(db_pool)
    .await?;
    Ok(roster)
}

/// Active students that have no enrollment row of any status in the course.
pub async fn available_students(db_pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Vec<StudentDto>> {
    let course = require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;

    let students = sqlx::query_as::<_, StudentDto>(&format!(
        r#"{}
        WHERE s.is_active = 1
          AND NOT EXISTS (
              SELECT 1 FROM course_enrollments ce
              WHERE ce.student_id = s.id AND ce.course_id = ?1
          )
        ORDER BY u.last_name ASC, u.first_name ASC"#,
        STUDENT_SELECT
    ))
    .bind(course_id)
    .fetch_all(db_pool)
    .await?;
    Ok(students)
}
