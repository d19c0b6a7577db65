// src/services/teacher_service.rs
use crate::{
    access::{Actor, Role},
    db,
    error::{AppError, AppResult},
    models::{
        course::CourseDto,
        teacher::{CreateTeacherRequest, NewTeacherProfile, TeacherDto, UpdateTeacherRequest, TEACHER_SELECT},
        user::NewUser,
        validate,
    },
    services::{
        course_service,
        numbering::{self, NumberKind, OnCollision},
        user_service,
    },
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_teacher(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<Option<TeacherDto>> {
    let teacher = sqlx::query_as::<_, TeacherDto>(&format!("{} WHERE t.id = ?1", TEACHER_SELECT))
        .bind(teacher_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(teacher)
}

pub async fn require_teacher(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<TeacherDto> {
    find_teacher(db_pool, teacher_id)
        .await?
        .ok_or_else(|| AppError::not_found("Teacher not found."))
}

pub async fn list_teachers(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<TeacherDto>> {
    actor.require_any(&[Role::Admin, Role::Teacher])?;
    let teachers = sqlx::query_as::<_, TeacherDto>(&format!(
        "{} ORDER BY u.last_name ASC, u.first_name ASC",
        TEACHER_SELECT
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(teachers)
}

pub async fn get_teacher(db_pool: &SqlitePool, actor: &Actor, teacher_id: i64) -> AppResult<TeacherDto> {
    actor.ensure_can_read_teacher(teacher_id)?;
    require_teacher(db_pool, teacher_id).await
}

pub async fn my_profile(db_pool: &SqlitePool, actor: &Actor) -> AppResult<TeacherDto> {
    let teacher_id = actor.acting_teacher_id()?;
    require_teacher(db_pool, teacher_id).await
}

pub async fn insert_profile(
    conn: &mut SqliteConnection,
    user_id: &str,
    profile: &NewTeacherProfile,
    on_collision: OnCollision,
) -> AppResult<i64> {
    let department = validate::optional_text("Department", profile.department.as_deref(), 100)?;
    let title = validate::optional_text("Title", profile.title.as_deref(), 100)?;
    let hire_date = profile.hire_date.unwrap_or_else(|| Utc::now().date_naive());
    let number = numbering::resolve(
        &mut *conn,
        NumberKind::Employee,
        profile.employee_number.as_deref(),
        on_collision,
    )
    .await?;

    let id = sqlx::query(
        r#"
        INSERT INTO teachers (employee_number, user_id, department, title, hire_date, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, 1)
        "#,
    )
    .bind(&number)
    .bind(user_id)
    .bind(department)
    .bind(title)
    .bind(hire_date)
    .execute(&mut *conn)
    .await
    .map_err(db::conflict_on_unique("Employee number already exists."))?
    .last_insert_rowid();

    tracing::info!("🧑‍🏫 Teacher profile {} ({}) created for user {}", id, number, user_id);
    Ok(id)
}

pub async fn create_teacher(
    db_pool: &SqlitePool,
    actor: &Actor,
    req: CreateTeacherRequest,
) -> AppResult<TeacherDto> {
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
    let profile = NewTeacherProfile {
        employee_number: req.employee_number,
        department: req.department,
        title: req.title,
        hire_date: req.hire_date.map(|d| d.date()),
    };

    let mut tx = db::begin_write(db_pool).await?;
    let user = user_service::insert_user(&mut *tx, &new_user, &[Role::Teacher]).await?;
    let teacher_id = insert_profile(&mut *tx, &user.id, &profile, OnCollision::Reject).await?;
    tx.commit().await?;

    require_teacher(db_pool, teacher_id).await
}

pub async fn update_teacher(
    db_pool: &SqlitePool,
    actor: &Actor,
    teacher_id: i64,
    req: UpdateTeacherRequest,
) -> AppResult<TeacherDto> {
    actor.require_admin()?;
    let teacher = require_teacher(db_pool, teacher_id).await?;
    let department = validate::optional_text("Department", req.department.as_deref(), 100)?;
    let title = validate::optional_text("Title", req.title.as_deref(), 100)?;

    let mut tx = db::begin_write(db_pool).await?;
    user_service::update_identity(
        &mut *tx,
        &teacher.user_id,
        &req.first_name,
        &req.last_name,
        req.phone_number.as_deref(),
        req.address.as_deref(),
        req.date_of_birth.map(|d| d.date()),
    )
    .await?;
    sqlx::query("UPDATE teachers SET department = ?1, title = ?2, is_active = ?3 WHERE id = ?4")
        .bind(department)
        .bind(title)
        .bind(req.is_active)
        .bind(teacher_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("✅ Teacher {} updated.", teacher_id);
    require_teacher(db_pool, teacher_id).await
}

pub async fn deactivate_teacher(db_pool: &SqlitePool, actor: &Actor, teacher_id: i64) -> AppResult<()> {
    actor.require_admin()?;
    let rows_affected = sqlx::query("UPDATE teachers SET is_active = 0 WHERE id = ?1")
        .bind(teacher_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::not_found("Teacher not found."));
    }
    tracing::info!("🗑️ Teacher {} deactivated.", teacher_id);
    Ok(())
}

/// Courses taught by a teacher: visible to Admin and to that teacher.
pub async fn teacher_courses(db_pool: &SqlitePool, actor: &Actor, teacher_id: i64) -> AppResult<Vec<CourseDto>> {
    if !actor.is_admin() && actor.teacher_id != Some(teacher_id) {
        return Err(AppError::forbidden("You can only view your own courses."));
    }
    require_teacher(db_pool, teacher_id).await?;
    course_service::courses_for_teacher(db_pool, teacher_id).await
}
