// src/web/attendance_handlers.rs
use crate::{
    access::Actor,
    error::AppResult,
    models::attendance::{
        AttendanceDto, AttendanceFilter, BulkAttendanceOutcome, BulkAttendanceRequest, CreateAttendanceRequest,
        UpdateAttendanceRequest,
    },
    services::attendance_service,
    state::AppState,
    web::extract::{Json, Path, Query},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<AttendanceDto>>> {
    Ok(Json(attendance_service::list_attendance(&state.db_pool, &actor).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<AttendanceDto>> {
    Ok(Json(attendance_service::get_attendance(&state.db_pool, &actor, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateAttendanceRequest>,
) -> AppResult<(StatusCode, Json<AttendanceDto>)> {
    let record = attendance_service::record_attendance(&state.db_pool, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

// POST /api/attendance/bulk
pub async fn bulk(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<BulkAttendanceRequest>,
) -> AppResult<Json<BulkAttendanceOutcome>> {
    Ok(Json(attendance_service::record_bulk_attendance(&state.db_pool, &actor, req).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAttendanceRequest>,
) -> AppResult<Json<AttendanceDto>> {
    Ok(Json(attendance_service::update_attendance(&state.db_pool, &actor, id, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    attendance_service::delete_attendance(&state.db_pool, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/attendance/course/{course_id}?date=YYYY-MM-DD
pub async fn by_course(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(course_id): Path<i64>,
    Query(filter): Query<AttendanceFilter>,
) -> AppResult<Json<Vec<AttendanceDto>>> {
    Ok(Json(
        attendance_service::course_attendance(&state.db_pool, &actor, course_id, filter.date).await?,
    ))
}

pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<AttendanceDto>>> {
    Ok(Json(attendance_service::my_attendance(&state.db_pool, &actor).await?))
}
