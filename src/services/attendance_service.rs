// src/services/attendance_service.rs
//! Attendance rows are keyed by the canonical UTC day.
//!
//! The single-record path refuses a second row for the same student, course
//! and day; the bulk path overwrites it. Both rely on the unique index over
//! `(student_id, course_id, date)` for racing writers.

use crate::{
    access::Actor,
    db,
    error::{AppError, AppResult},
    models::{
        attendance::{
            Attendance, AttendanceDto, BulkAttendanceOutcome, BulkAttendanceRequest, CreateAttendanceRequest,
            UpdateAttendanceRequest, ATTENDANCE_SELECT, MAX_NOTES_LEN,
        },
        day::UtcDay,
        validate,
    },
    services::{course_service, enrollment_service, student_service},
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

const DUPLICATE_DAY: &str = "Attendance already recorded for this student, course and date.";

async fn find_attendance_row(db_pool: &SqlitePool, attendance_id: i64) -> AppResult<Attendance> {
    sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, student_id, course_id, teacher_id, date, status, notes, created_at
        FROM attendances WHERE id = ?1
        "#,
    )
    .bind(attendance_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Attendance record not found."))
}

async fn attendance_dto(db_pool: &SqlitePool, attendance_id: i64) -> AppResult<AttendanceDto> {
    sqlx::query_as::<_, AttendanceDto>(&format!("{} WHERE a.id = ?1", ATTENDANCE_SELECT))
        .bind(attendance_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record not found."))
}

async fn day_taken(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
    day: UtcDay,
    except_id: Option<i64>,
) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM attendances
        WHERE student_id = ?1 AND course_id = ?2 AND date = ?3 AND id != ?4
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(day.date())
    .bind(except_id.unwrap_or(-1))
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

pub async fn list_attendance(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<AttendanceDto>> {
    actor.require_admin()?;
    let rows = sqlx::query_as::<_, AttendanceDto>(&format!(
        "{} ORDER BY a.date DESC, a.id DESC",
        ATTENDANCE_SELECT
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

pub async fn get_attendance(db_pool: &SqlitePool, actor: &Actor, attendance_id: i64) -> AppResult<AttendanceDto> {
    let record = attendance_dto(db_pool, attendance_id).await?;
    actor.ensure_can_read_record(record.student_id, record.teacher_id)?;
    Ok(record)
}

/// Attendance of one course, optionally restricted to one day.
pub async fn course_attendance(
    db_pool: &SqlitePool,
    actor: &Actor,
    course_id: i64,
    day: Option<UtcDay>,
) -> AppResult<Vec<AttendanceDto>> {
    let course = course_service::require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;

    let rows = match day {
        Some(day) => {
            sqlx::query_as::<_, AttendanceDto>(&format!(
                "{} WHERE a.course_id = ?1 AND a.date = ?2 ORDER BY su.last_name ASC, su.first_name ASC",
                ATTENDANCE_SELECT
            ))
            .bind(course_id)
            .bind(day.date())
            .fetch_all(db_pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, AttendanceDto>(&format!(
                "{} WHERE a.course_id = ?1 ORDER BY a.date DESC, su.last_name ASC",
                ATTENDANCE_SELECT
            ))
            .bind(course_id)
            .fetch_all(db_pool)
            .await?
        }
    };
    Ok(rows)
}

pub async fn my_attendance(db_pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<AttendanceDto>> {
    let student_id = actor.acting_student_id()?;
    let rows = sqlx::query_as::<_, AttendanceDto>(&format!(
        "{} WHERE a.student_id = ?1 ORDER BY a.date DESC, c.course_code ASC",
        ATTENDANCE_SELECT
    ))
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Single-record path: a second row for the same day is a conflict.
pub async fn record_attendance(
    db_pool: &SqlitePool,
    actor: &Actor,
    req: CreateAttendanceRequest,
) -> AppResult<AttendanceDto> {
    let notes = validate::optional_text("Notes", req.notes.as_deref(), MAX_NOTES_LEN)?;
    let course = course_service::require_course(db_pool, req.course_id).await?;
    let teacher_id = actor.ensure_course_owner(course.teacher_id)?;
    student_service::require_student(db_pool, req.student_id).await?;
    if !enrollment_service::has_active_enrollment(db_pool, req.student_id, req.course_id).await? {
        return Err(AppError::validation("Student is not actively enrolled in this course."));
    }

    let mut conn = db_pool.acquire().await?;
    if day_taken(&mut *conn, req.student_id, req.course_id, req.date, None).await? {
        tracing::warn!(
            "Attendance refused: student {} already has a record in course {} on {}.",
            req.student_id,
            req.course_id,
            req.date
        );
        return Err(AppError::conflict(DUPLICATE_DAY));
    }

    let attendance_id = sqlx::query(
        r#"
        INSERT INTO attendances (student_id, course_id, teacher_id, date, status, notes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(req.student_id)
    .bind(req.course_id)
    .bind(teacher_id)
    .bind(req.date.date())
    .bind(req.status)
    .bind(notes)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(db::conflict_on_unique(DUPLICATE_DAY))?
    .last_insert_rowid();
    drop(conn);

    tracing::info!(
        "🗓️ Attendance {:?} recorded for student {} in course {} on {}.",
        req.status,
        req.student_id,
        req.course_id,
        req.date
    );
    attendance_dto(db_pool, attendance_id).await
}

/// Bulk path for one course and day. Students without an active enrollment are
/// skipped; existing rows for the day are overwritten. One transaction.
pub async fn record_bulk_attendance(
    db_pool: &SqlitePool,
    actor: &Actor,
    req: BulkAttendanceRequest,
) -> AppResult<BulkAttendanceOutcome> {
    let course = course_service::require_course(db_pool, req.course_id).await?;
    let teacher_id = actor.ensure_course_owner(course.teacher_id)?;

    let mut entries = Vec::with_capacity(req.student_attendances.len());
    for entry in req.student_attendances {
        let notes = validate::optional_text("Notes", entry.notes.as_deref(), MAX_NOTES_LEN)?;
        entries.push((entry.student_id, entry.status, notes));
    }

    let now = Utc::now();
    let mut written_ids = Vec::new();
    let mut skipped_student_ids = Vec::new();

    let mut tx = db::begin_write(db_pool).await?;
    let active = enrollment_service::active_student_ids(&mut *tx, req.course_id).await?;
    for (student_id, status, notes) in entries {
        if !active.contains(&student_id) {
            tracing::debug!("Bulk attendance: skipping student {} (no active enrollment).", student_id);
            if !skipped_student_ids.contains(&student_id) {
                skipped_student_ids.push(student_id);
            }
            continue;
        }

        let attendance_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO attendances (student_id, course_id, teacher_id, date, status, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (student_id, course_id, date)
            DO UPDATE SET status = excluded.status, notes = excluded.notes
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(req.course_id)
        .bind(teacher_id)
        .bind(req.date.date())
        .bind(status)
        .bind(notes)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if !written_ids.contains(&attendance_id) {
            written_ids.push(attendance_id);
        }
    }
    tx.commit().await?;

    tracing::info!(
        "🗓️ Bulk attendance for course {} on {}: {} written, {} skipped.",
        req.course_id,
        req.date,
        written_ids.len(),
        skipped_student_ids.len()
    );

    let mut records = Vec::with_capacity(written_ids.len());
    for id in written_ids {
        records.push(attendance_dto(db_pool, id).await?);
    }
    Ok(BulkAttendanceOutcome {
        date: req.date,
        records,
        skipped_student_ids,
    })
}

/// Only the teacher on the record may change it. Moving it onto a day that
/// already has a record for the pair is a conflict.
pub async fn update_attendance(
    db_pool: &SqlitePool,
    actor: &Actor,
    attendance_id: i64,
    req: UpdateAttendanceRequest,
) -> AppResult<AttendanceDto> {
    let notes = validate::optional_text("Notes", req.notes.as_deref(), MAX_NOTES_LEN)?;
    let record = find_attendance_row(db_pool, attendance_id).await?;
    ensure_record_author(actor, &record)?;

    let mut conn = db_pool.acquire().await?;
    if day_taken(&mut *conn, record.student_id, record.course_id, req.date, Some(record.id)).await? {
        return Err(AppError::conflict(DUPLICATE_DAY));
    }
    sqlx::query("UPDATE attendances SET date = ?1, status = ?2, notes = ?3 WHERE id = ?4")
        .bind(req.date.date())
        .bind(req.status)
        .bind(notes)
        .bind(attendance_id)
        .execute(&mut *conn)
        .await
        .map_err(db::conflict_on_unique(DUPLICATE_DAY))?;
    drop(conn);

    tracing::info!("✅ Attendance {} updated.", attendance_id);
    attendance_dto(db_pool, attendance_id).await
}

pub async fn delete_attendance(db_pool: &SqlitePool, actor: &Actor, attendance_id: i64) -> AppResult<()> {
    let record = find_attendance_row(db_pool, attendance_id).await?;
    ensure_record_author(actor, &record)?;

    sqlx::query("DELETE FROM attendances WHERE id = ?1")
        .bind(attendance_id)
        .execute(db_pool)
        .await?;
    tracing::info!("🗑️ Attendance {} deleted.", attendance_id);
    Ok(())
}

fn ensure_record_author(actor: &Actor, record: &Attendance) -> AppResult<()> {
    let teacher_id = actor.acting_teacher_id()?;
    if teacher_id != record.teacher_id {
        return Err(AppError::forbidden("You can only modify attendance you recorded."));
    }
    Ok(())
}
