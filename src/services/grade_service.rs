// src/services/grade_service.rs
use crate::{
    access::{Actor, Role},
    error::{AppError, AppResult},
    models::{
        grade::{
            validate_score, CreateGradeRequest, Grade, GradeDto, UpdateGradeRequest, GRADE_SELECT, MAX_COMMENTS_LEN,
            MAX_EXAM_TYPE_LEN,
        },
        validate,
    },
    services::{course_service, enrollment_service, student_service},
};
use chrono::Utc;
use sqlx::SqlitePool;

async fn find_grade_row(db_pool: &SqlitePool, grade_id: i64) -> AppResult<Grade> {
    sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, student_id, course_id, teacher_id, exam_type, score, comments, created_at, updated_at
        FROM grades WHERE id = ?1
        "#,
    )
    .bind(grade_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Grade not found."))
}

async fn grade_dto(db_pool: &SqlitePool, grade_id: i64) -> AppResult<GradeDto> {
    sqlx::query_as::<_, GradeDto>(&format!("{} WHERE g.id = ?1", GRADE_SELECT))
        .bind(grade_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Grade not found."))
}

async fn grades_where(db_pool: &SqlitePool, clause: &str, binds: &[i64]) -> AppResult<Vec<GradeDto>> {
    let sql = format!("{} {} ORDER BY g.created_at DESC, g.id DESC", GRADE_SELECT, clause);
    let mut query = sqlx::query_as::<_, GradeDto>(&sql);
    for value in binds {
        query = query.bind(*value);
    }
    Ok(query.fetch_all(db_pool).await?)
}

pub async fn list_grades(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<GradeDto>> {
    actor.require_admin()?;
    grades_where(db_pool, "", &[]).await
}

pub async fn get_grade(db_pool: &SqlitePool, actor: &Actor, grade_id: i64) -> AppResult<GradeDto> {
    let grade = grade_dto(db_pool, grade_id).await?;
    actor.ensure_can_read_record(grade.student_id, grade.teacher_id)?;
    Ok(grade)
}

/// Grades of one course, for Admin or the owning teacher.
pub async fn course_grades(db_pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Vec<GradeDto>> {
    let course = course_service::require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;
    grades_where(db_pool, "WHERE g.course_id = ?1", &[course_id]).await
}

/// A student's grades. A teacher who is not also admin or that student sees only the rows they recorded.
pub async fn student_grades(db_pool: &SqlitePool, actor: &Actor, student_id: i64) -> AppResult<Vec<GradeDto>> {
    actor.ensure_can_read_student(student_id)?;
    student_service::require_student(db_pool, student_id).await?;

    if actor.is_admin() || actor.student_id == Some(student_id) {
        return grades_where(db_pool, "WHERE g.student_id = ?1", &[student_id]).await;
    }
    match actor.teacher_id.filter(|_| actor.has_role(Role::Teacher)) {
        Some(teacher_id) => {
            grades_where(db_pool, "WHERE g.student_id = ?1 AND g.teacher_id = ?2", &[student_id, teacher_id]).await
        }
        None => Ok(Vec::new()),
    }
}

pub async fn my_grades(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<GradeDto>> {
    let student_id = actor.acting_student_id()?;
    grades_where(db_pool, "WHERE g.student_id = ?1", &[student_id]).await
}

/// The caller's grades in one course; any enrollment row, including a dropped one, grants access.
pub async fn my_course_grades(db_pool: &SqlitePool, actor: &Actor, course_id: i64) -> AppResult<Vec<GradeDto>> {
    let student_id = actor.acting_student_id()?;
    if !enrollment_service::has_any_enrollment(db_pool, student_id, course_id).await? {
        return Err(AppError::forbidden("You are not enrolled in this course."));
    }
    grades_where(
        db_pool,
        "WHERE g.student_id = ?1 AND g.course_id = ?2",
        &[student_id, course_id],
    )
    .await
}

/// Records a grade. The score is checked before anything is read or written.
pub async fn record_grade(db_pool: &SqlitePool, actor: &Actor, req: CreateGradeRequest) -> AppResult<GradeDto> {
    let score = validate_score(req.score)?;
    let exam_type = validate::required_text("Exam type", &req.exam_type, MAX_EXAM_TYPE_LEN)?;
    let comments = validate::optional_text("Comments", req.comments.as_deref(), MAX_COMMENTS_LEN)?;

    let course = course_service::require_course(db_pool, req.course_id).await?;
    let teacher_id = actor.ensure_course_owner(course.teacher_id)?;
    student_service::require_student(db_pool, req.student_id).await?;
    if !enrollment_service::has_active_enrollment(db_pool, req.student_id, req.course_id).await? {
        return Err(AppError::validation("Student is not actively enrolled in this course."));
    }

    let now = Utc::now();
    let grade_id = sqlx::query(
        r#"
        INSERT INTO grades (student_id, course_id, teacher_id, exam_type, score, comments, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        "#,
    )
    .bind(req.student_id)
    .bind(req.course_id)
    .bind(teacher_id)
    .bind(&exam_type)
    .bind(score)
    .bind(comments)
    .bind(now)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!(
        "📝 Grade {} ({} = {}) recorded for student {} in course {}.",
        grade_id,
        exam_type,
        score,
        req.student_id,
        req.course_id
    );
    grade_dto(db_pool, grade_id).await
}

/// Only the teacher who recorded the grade may change it.
pub async fn update_grade(
    db_pool: &SqlitePool,
    actor: &Actor,
    grade_id: i64,
    req: UpdateGradeRequest,
) -> AppResult<GradeDto> {
    let score = validate_score(req.score)?;
    let exam_type = validate::required_text("Exam type", &req.exam_type, MAX_EXAM_TYPE_LEN)?;
    let comments = validate::optional_text("Comments", req.comments.as_deref(), MAX_COMMENTS_LEN)?;

    let grade = find_grade_row(db_pool, grade_id).await?;
    ensure_grade_author(db_pool, actor, &grade).await?;

    sqlx::query("UPDATE grades SET exam_type = ?1, score = ?2, comments = ?3, updated_at = ?4 WHERE id = ?5")
        .bind(exam_type)
        .bind(score)
        .bind(comments)
        .bind(Utc::now())
        .bind(grade_id)
        .execute(db_pool)
        .await?;

    tracing::info!("✅ Grade {} updated.", grade_id);
    grade_dto(db_pool, grade_id).await
}

pub async fn delete_grade(db_pool: &SqlitePool, actor: &Actor, grade_id: i64) -> AppResult<()> {
    let grade = find_grade_row(db_pool, grade_id).await?;
    ensure_grade_author(db_pool, actor, &grade).await?;

    sqlx::query("DELETE FROM grades WHERE id = ?1")
        .bind(grade_id)
        .execute(db_pool)
        .await?;
    tracing::info!("🗑️ Grade {} deleted.", grade_id);
    Ok(())
}

/// The caller must still own the course and be the teacher stamped on the row.
async fn ensure_grade_author(db_pool: &SqlitePool, actor: &Actor, grade: &Grade) -> AppResult<()> {
    let course = course_service::require_course(db_pool, grade.course_id).await?;
    let teacher_id = actor.ensure_course_owner(course.teacher_id)?;
    if teacher_id != grade.teacher_id {
        return Err(AppError::forbidden("You can only modify grades you recorded."));
    }
    Ok(())
}
