// src/services/student_service.rs
use crate::{
    access::{Actor, Role},
    db,
    error::{AppError, AppResult},
    models::{
        enrollment::CourseEnrollmentDto,
        student::{CreateStudentRequest, NewStudentProfile, StudentDto, UpdateStudentRequest, STUDENT_SELECT},
        user::NewUser,
        validate,
    },
    services::{
        enrollment_service,
        numbering::{self, NumberKind, OnCollision},
        user_service,
    },
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<Option<StudentDto>> {
    let student = sqlx::query_as::<_, StudentDto>(&format!("{} WHERE s.id = ?1", STUDENT_SELECT))
        .bind(student_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(student)
}

pub async fn require_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<StudentDto> {
    find_student(db_pool, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found."))
}

pub async fn list_students(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<StudentDto>> {
    actor.require_any(&[Role::Admin, Role::Teacher])?;
    let students = sqlx::query_as::<_, StudentDto>(&format!(
        "{} ORDER BY u.last_name ASC, u.first_name ASC",
        STUDENT_SELECT
    ))
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Listed {} students.", students.len());
    Ok(students)
}

pub async fn get_student(db_pool: &SqlitePool, actor: &Actor, student_id: i64) -> AppResult<StudentDto> {
    actor.ensure_can_read_student(student_id)?;
    require_student(db_pool, student_id).await
}

pub async fn my_profile(db_pool: &SqlitePool, actor: &Actor) -> AppResult<StudentDto> {
    let student_id = actor.acting_student_id()?;
    require_student(db_pool, student_id).await
}

/// Inserts the profile row for an already-inserted user.
pub async fn insert_profile(
    conn: &mut SqliteConnection,
    user_id: &str,
    profile: &NewStudentProfile,
    on_collision: OnCollision,
) -> AppResult<i64> {
    let department = validate::optional_text("Department", profile.department.as_deref(), 100)?;
    if let Some(year) = profile.year {
        if !(1..=10).contains(&year) {
            return Err(AppError::validation("Year must be between 1 and 10."));
        }
    }
    let number = numbering::resolve(
        &mut *conn,
        NumberKind::Student,
        profile.student_number.as_deref(),
        on_collision,
    )
    .await?;

    let id = sqlx::query(
        r#"
        INSERT INTO students (student_number, user_id, enrollment_date, department, year, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, 1)
        "#,
    )
    .bind(&number)
    .bind(user_id)
    .bind(Utc::now())
    .bind(department)
    .bind(profile.year)
    .execute(&mut *conn)
    .await
    .map_err(db::conflict_on_unique("Student number already exists."))?
    .last_insert_rowid();

    tracing::info!("🎓 Student profile {} ({}) created for user {}", id, number, user_id);
    Ok(id)
}

/// Directory creation by an administrator: user, Student role and profile in one transaction.
pub async fn create_student(
    db_pool: &SqlitePool,
    actor: &Actor,
    req: CreateStudentRequest,
) -> AppResult<StudentDto> {
    actor.require_admin()?;

    let new_user = NewUser {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
        address: req.address,
        date_of_birth: req.date_of_birth.map(|d| d.date()),
    };
    let profile = NewStudentProfile {
        student_number: req.student_number,
        department: req.department,
        year: req.year,
    };

    let mut tx = db::begin_write(db_pool).await?;
    let user = user_service::insert_user(&mut *tx, &new_user, &[Role::Student]).await?;
    let student_id = insert_profile(&mut *tx, &user.id, &profile, OnCollision::Reject).await?;
    tx.commit().await?;

    require_student(db_pool, student_id).await
}

pub async fn update_student(
    db_pool: &SqlitePool,
    actor: &Actor,
    student_id: i64,
    req: UpdateStudentRequest,
) -> AppResult<StudentDto> {
    actor.require_admin()?;
    let student = require_student(db_pool, student_id).await?;
    let department = validate::optional_text("Department", req.department.as_deref(), 100)?;
    if let Some(year) = req.year {
        if !(1..=10).contains(&year) {
            return Err(AppError::validation("Year must be between 1 and 10."));
        }
    }

    let mut tx = db::begin_write(db_pool).await?;
    user_service::update_identity(
        &mut *tx,
        &student.user_id,
        &req.first_name,
        &req.last_name,
        req.phone_number.as_deref(),
        req.address.as_deref(),
        req.date_of_birth.map(|d| d.date()),
    )
    .await?;
    sqlx::query("UPDATE students SET department = ?1, year = ?2, is_active = ?3 WHERE id = ?4")
        .bind(department)
        .bind(req.year)
        .bind(req.is_active)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("✅ Student {} updated.", student_id);
    require_student(db_pool, student_id).await
}

/// Soft delete: the row stays, `is_active` goes false.
pub async fn deactivate_student(db_pool: &SqlitePool, actor: &Actor, student_id: i64) -> AppResult<()> {
    actor.require_admin()?;
    let rows_affected = sqlx::query("UPDATE students SET is_active = 0 WHERE id = ?1")
        .bind(student_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::not_found("Student not found."));
    }
    tracing::info!("🗑️ Student {} deactivated.", student_id);
    Ok(())
}

pub async fn student_courses(
    db_pool: &SqlitePool,
    actor: &Actor,
    student_id: i64,
) -> AppResult<Vec<CourseEnrollmentDto>> {
    actor.ensure_can_read_student(student_id)?;
    require_student(db_pool, student_id).await?;
    enrollment_service::enrollments_for_student(db_pool, student_id, false).await
}
