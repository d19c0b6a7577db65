// src/web/teacher_handlers.rs
use crate::{
    access::Actor,
    error::AppResult,
    models::{
        course::CourseDto,
        teacher::{CreateTeacherRequest, TeacherDto, UpdateTeacherRequest},
    },
    services::teacher_service,
    state::AppState,
    web::extract::{Json, Path},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

pub async fn list(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> AppResult<Json<Vec<TeacherDto>>> {
    Ok(Json(teacher_service::list_teachers(&state.db_pool, &actor).await?))
}

pub async fn my_profile(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> AppResult<Json<TeacherDto>> {
    Ok(Json(teacher_service::my_profile(&state.db_pool, &actor).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<TeacherDto>> {
    Ok(Json(teacher_service::get_teacher(&state.db_pool, &actor, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTeacherRequest>,
) -> AppResult<(StatusCode, Json<TeacherDto>)> {
    let teacher = teacher_service::create_teacher(&state.db_pool, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTeacherRequest>,
) -> AppResult<Json<TeacherDto>> {
    Ok(Json(teacher_service::update_teacher(&state.db_pool, &actor, id, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    teacher_service::deactivate_teacher(&state.db_pool, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn courses(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<CourseDto>>> {
    Ok(Json(teacher_service::teacher_courses(&state.db_pool, &actor, id).await?))
}
