// src/web/course_handlers.rs
use crate::{
    access::Actor,
    error::AppResult,
    models::{
        course::{CourseDto, CourseStudentDto, CreateCourseRequest, UpdateCourseRequest},
        enrollment::{AddStudentsRequest, AddStudentsResponse, CourseEnrollmentDto, CreateEnrollmentRequest},
        student::StudentDto,
    },
    services::{course_service, enrollment_service},
    state::AppState,
    web::extract::{Json, Path},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

// GET /api/courses
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<CourseDto>>> {
    Ok(Json(course_service::list_courses(&state.db_pool).await?))
}

// GET /api/courses/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<CourseDto>> {
    Ok(Json(course_service::require_course(&state.db_pool, id).await?))
}

// POST /api/courses
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCourseRequest>,
) -> AppResult<(StatusCode, Json<CourseDto>)> {
    let course = course_service::create_course(&state.db_pool, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

// PUT /api/courses/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCourseRequest>,
) -> AppResult<Json<CourseDto>> {
    Ok(Json(course_service::update_course(&state.db_pool, &actor, id, req).await?))
}

// DELETE /api/courses/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    course_service::delete_course(&state.db_pool, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/courses/my-courses
pub async fn my_courses(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<CourseEnrollmentDto>>> {
    Ok(Json(enrollment_service::my_courses(&state.db_pool, &actor).await?))
}

// GET /api/courses/my-teacher-courses
pub async fn my_teacher_courses(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<CourseDto>>> {
    Ok(Json(course_service::my_teacher_courses(&state.db_pool, &actor).await?))
}

// GET /api/courses/{id}/students
pub async fn students(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<CourseStudentDto>>> {
    Ok(Json(course_service::course_students(&state.db_pool, &actor, id).await?))
}

// GET /api/courses/{id}/available-students
pub async fn available_students(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<StudentDto>>> {
    Ok(Json(course_service::available_students(&state.db_pool, &actor, id).await?))
}

// POST /api/courses/{id}/enroll
pub async fn enroll(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<CreateEnrollmentRequest>,
) -> AppResult<(StatusCode, Json<CourseEnrollmentDto>)> {
    let enrollment = enrollment_service::create_enrollment(&state.db_pool, &actor, id, req).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

// POST /api/courses/{id}/add-students
pub async fn add_students(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<AddStudentsRequest>,
) -> AppResult<Json<AddStudentsResponse>> {
    Ok(Json(enrollment_service::add_students(&state.db_pool, &actor, id, req).await?))
}

// DELETE /api/courses/{course_id}/students/{student_id}
pub async fn drop_student(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((course_id, student_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    enrollment_service::drop_enrollment(&state.db_pool, &actor, course_id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
