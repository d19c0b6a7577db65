// src/web/page_handlers.rs
use crate::{
    access::{Actor, Role},
    error::{AppError, AppResult},
    models::{
        attendance::{AttendanceStatus, BulkAttendanceOutcome, BulkAttendanceRequest, StudentAttendanceEntry},
        day::UtcDay,
        enrollment::CreateEnrollmentRequest,
    },
    services::{attendance_service, course_service, enrollment_service, grade_service, user_service},
    state::AppState,
    templates::{render, CoursePage, DashboardPage, PageResult},
    web::flash::{self, FlashKind},
};
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use std::collections::HashMap;
use tower_cookies::Cookies;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollForm {
    student_id: i64,
}

/// Stores the outcome of a form POST as a flash message and redirects back.
fn finish<T>(state: &AppState, cookies: &Cookies, back_to: &str, result: AppResult<T>, success: &str) -> Redirect {
    match result {
        Ok(_) => flash::set(cookies, &state.cookie_key, FlashKind::Success, success),
        Err(e) => {
            if e.status_code().is_server_error() {
                tracing::error!("Form action on {} failed: {:?}", back_to, e);
            } else {
                tracing::warn!("Form action on {} rejected: {}", back_to, e);
            }
            flash::set(cookies, &state.cookie_key, FlashKind::Error, &e.public_message());
        }
    }
    Redirect::to(back_to)
}

// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    cookies: Cookies,
) -> PageResult<Html<String>> {
    let db_pool = &state.db_pool;
    let user = user_service::find_user_by_id(db_pool, &actor.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;

    let is_admin = actor.is_admin();
    let is_teacher = actor.has_role(Role::Teacher) && actor.teacher_id.is_some();
    let is_student = actor.has_role(Role::Student) && actor.student_id.is_some();

    let courses = if is_admin {
        course_service::list_courses(db_pool).await?
    } else if is_teacher {
        course_service::my_teacher_courses(db_pool, &actor).await?
    } else {
        Vec::new()
    };

    let (enrollments, grades, attendance) = if is_student {
        (
            enrollment_service::my_courses(db_pool, &actor).await?,
            grade_service::my_grades(db_pool, &actor).await?,
            attendance_service::my_attendance(db_pool, &actor).await?,
        )
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    let page = DashboardPage {
        user_name: user.full_name(),
        roles: actor.roles.names().join(", "),
        is_admin,
        is_teacher,
        is_student,
        courses,
        enrollments,
        grades,
        attendance,
        flash: flash::take(&cookies, &state.cookie_key),
    };
    Ok(render(&page)?)
}

// GET /dashboard/courses/{id}?date=
pub async fn course_page(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(course_id): Path<i64>,
    Query(query): Query<DayQuery>,
    cookies: Cookies,
) -> PageResult<Html<String>> {
    let db_pool = &state.db_pool;
    let course = course_service::require_course(db_pool, course_id).await?;
    actor.ensure_can_manage_course(course.teacher_id)?;

    let day = query
        .date
        .as_deref()
        .and_then(UtcDay::parse)
        .unwrap_or_else(UtcDay::today);

    let page = CoursePage {
        roster: course_service::course_students(db_pool, &actor, course_id).await?,
        available: course_service::available_students(db_pool, &actor, course_id).await?,
        grades: grade_service::course_grades(db_pool, &actor, course_id).await?,
        attendance: attendance_service::course_attendance(db_pool, &actor, course_id, Some(day)).await?,
        day: day.to_string(),
        can_record: actor.owns_course(course.teacher_id),
        statuses: AttendanceStatus::ALL.to_vec(),
        course,
        flash: flash::take(&cookies, &state.cookie_key),
    };
    Ok(render(&page)?)
}

// POST /dashboard/courses/{id}/enroll
pub async fn handle_enroll(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(course_id): Path<i64>,
    cookies: Cookies,
    Form(form): Form<EnrollForm>,
) -> Redirect {
    let req = CreateEnrollmentRequest {
        student_id: form.student_id,
        comments: None,
    };
    let result = enrollment_service::create_enrollment(&state.db_pool, &actor, course_id, req).await;
    let back_to = format!("/dashboard/courses/{}", course_id);
    finish(&state, &cookies, &back_to, result, "Student enrolled.")
}

// POST /dashboard/courses/{course_id}/students/{student_id}/drop
pub async fn handle_drop(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((course_id, student_id)): Path<(i64, i64)>,
    cookies: Cookies,
) -> Redirect {
    let result = enrollment_service::drop_enrollment(&state.db_pool, &actor, course_id, student_id).await;
    let back_to = format!("/dashboard/courses/{}", course_id);
    finish(&state, &cookies, &back_to, result, "Student dropped from the course.")
}

/// Reads `status_<student id>` fields; blank selections are left out.
fn attendance_entries(form: &HashMap<String, String>) -> AppResult<Vec<StudentAttendanceEntry>> {
    let mut entries = Vec::new();
    for (field, value) in form {
        let Some(raw_id) = field.strip_prefix("status_") else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        let student_id = raw_id
            .parse::<i64>()
            .map_err(|_| AppError::validation(format!("Invalid field '{}'.", field)))?;
        entries.push(StudentAttendanceEntry {
            student_id,
            status: value.parse()?,
            notes: None,
        });
    }
    entries.sort_by_key(|e| e.student_id);
    Ok(entries)
}

async fn submit_bulk_attendance(
    state: &AppState,
    actor: &Actor,
    course_id: i64,
    day: Option<UtcDay>,
    form: &HashMap<String, String>,
) -> AppResult<BulkAttendanceOutcome> {
    let date = day.ok_or_else(|| AppError::validation("A valid date is required."))?;
    let req = BulkAttendanceRequest {
        course_id,
        date,
        student_attendances: attendance_entries(form)?,
    };
    attendance_service::record_bulk_attendance(&state.db_pool, actor, req).await
}

// POST /dashboard/courses/{id}/attendance
pub async fn handle_bulk_attendance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(course_id): Path<i64>,
    cookies: Cookies,
    Form(form): Form<HashMap<String, String>>,
) -> Redirect {
    let day = form.get("date").and_then(|d| UtcDay::parse(d));
    let back_to = match day {
        Some(day) => format!("/dashboard/courses/{}?date={}", course_id, day),
        None => format!("/dashboard/courses/{}", course_id),
    };

    let result = submit_bulk_attendance(&state, &actor, course_id, day, &form).await;

    let message = match &result {
        Ok(outcome) if !outcome.skipped_student_ids.is_empty() => format!(
            "Attendance saved for {} student(s); {} without an active enrollment skipped.",
            outcome.records.len(),
            outcome.skipped_student_ids.len()
        ),
        Ok(outcome) => format!("Attendance saved for {} student(s).", outcome.records.len()),
        Err(_) => String::new(),
    };
    finish(&state, &cookies, &back_to, result, &message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_form_fields_become_entries() {
        let form: HashMap<String, String> = [
            ("date", "2025-03-02"),
            ("status_4", "Late"),
            ("status_2", "present"),
            ("status_9", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let entries = attendance_entries(&form).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].student_id, 2);
        assert_eq!(entries[0].status, AttendanceStatus::Present);
        assert_eq!(entries[1].status, AttendanceStatus::Late);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let form: HashMap<String, String> = [("status_1".to_string(), "Sleeping".to_string())].into();
        assert!(matches!(attendance_entries(&form), Err(AppError::Validation(_))));
    }
}
