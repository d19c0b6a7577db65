// src/web/student_handlers.rs
use crate::{
    access::Actor,
    error::AppResult,
    models::{
        enrollment::CourseEnrollmentDto,
        grade::GradeDto,
        student::{CreateStudentRequest, StudentDto, UpdateStudentRequest},
    },
    services::{grade_service, student_service},
    state::AppState,
    web::extract::{Json, Path},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

// GET /api/students
pub async fn list(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> AppResult<Json<Vec<StudentDto>>> {
    Ok(Json(student_service::list_students(&state.db_pool, &actor).await?))
}

// GET /api/students/my-profile
pub async fn my_profile(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> AppResult<Json<StudentDto>> {
    Ok(Json(student_service::my_profile(&state.db_pool, &actor).await?))
}

// GET /api/students/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<StudentDto>> {
    Ok(Json(student_service::get_student(&state.db_pool, &actor, id).await?))
}

// POST /api/students
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateStudentRequest>,
) -> AppResult<(StatusCode, Json<StudentDto>)> {
    let student = student_service::create_student(&state.db_pool, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

// PUT /api/students/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStudentRequest>,
) -> AppResult<Json<StudentDto>> {
    Ok(Json(student_service::update_student(&state.db_pool, &actor, id, req).await?))
}

// DELETE /api/students/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    student_service::deactivate_student(&state.db_pool, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/students/{id}/courses
pub async fn courses(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<CourseEnrollmentDto>>> {
    Ok(Json(student_service::student_courses(&state.db_pool, &actor, id).await?))
}

// GET /api/students/{id}/grades
pub async fn grades(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<GradeDto>>> {
    Ok(Json(grade_service::student_grades(&state.db_pool, &actor, id).await?))
}
