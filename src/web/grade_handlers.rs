// src/web/grade_handlers.rs
use crate::{
    access::Actor,
    error::AppResult,
    models::grade::{CreateGradeRequest, GradeDto, UpdateGradeRequest},
    services::grade_service,
    state::AppState,
    web::extract::{Json, Path},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

pub async fn list(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> AppResult<Json<Vec<GradeDto>>> {
    Ok(Json(grade_service::list_grades(&state.db_pool, &actor).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<GradeDto>> {
    Ok(Json(grade_service::get_grade(&state.db_pool, &actor, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateGradeRequest>,
) -> AppResult<(StatusCode, Json<GradeDto>)> {
    let grade = grade_service::record_grade(&state.db_pool, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateGradeRequest>,
) -> AppResult<Json<GradeDto>> {
    Ok(Json(grade_service::update_grade(&state.db_pool, &actor, id, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    grade_service::delete_grade(&state.db_pool, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/grades/course/{course_id}
pub async fn by_course(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<Vec<GradeDto>>> {
    Ok(Json(grade_service::course_grades(&state.db_pool, &actor, course_id).await?))
}

// GET /api/grades/my-grades
pub async fn my_grades(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> AppResult<Json<Vec<GradeDto>>> {
    Ok(Json(grade_service::my_grades(&state.db_pool, &actor).await?))
}

// GET /api/grades/my-grades/{course_id}
pub async fn my_course_grades(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<Vec<GradeDto>>> {
    Ok(Json(grade_service::my_course_grades(&state.db_pool, &actor, course_id).await?))
}
