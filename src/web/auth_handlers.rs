// src/web/auth_handlers.rs
use crate::{
    access::Actor,
    error::{AppError, AppResult},
    models::user::{AuthResponse, LoginForm, RegisterRequest, UserDto},
    services::{auth_service, user_service},
    state::AppState,
    templates::{render, LoginPage, PageResult},
    web::{
        extract::Json,
        mw_auth::{self, USER_ID_KEY},
    },
};
use axum::{
    extract::{Extension, Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

/// Gives the session a fresh id and binds it to the user.
async fn start_session(session: &Session, user_id: &str) -> AppResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to cycle session id: {}", e)))?;
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to write session: {}", e)))?;
    Ok(())
}

async fn profile_of(state: &AppState, user_id: &str) -> AppResult<UserDto> {
    let actor = user_service::load_actor(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    user_service::user_profile(&state.db_pool, &actor).await
}

// --- JSON API (/api/auth) ---

// POST /api/auth/login
pub async fn api_login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<Json<AuthResponse>> {
    tracing::info!("Login attempt for {}", form.email);
    let user = auth_service::authenticate(&state.db_pool, &form.email, &form.password).await?;
    start_session(&session, &user.id).await?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful.".to_string(),
        user: Some(profile_of(&state, &user.id).await?),
    }))
}

// POST /api/auth/register
pub async fn api_register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = auth_service::register(&state.db_pool, req).await?;
    start_session(&session, &user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Registration successful.".to_string(),
            user: Some(profile_of(&state, &user.id).await?),
        }),
    ))
}

// POST /api/auth/logout
pub async fn api_logout(session: Session) -> AppResult<Json<AuthResponse>> {
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to delete session: {}", e)))?;
    Ok(Json(AuthResponse {
        success: true,
        message: "Logged out.".to_string(),
        user: None,
    }))
}

// GET /api/auth/profile
pub async fn api_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<UserDto>> {
    Ok(Json(user_service::user_profile(&state.db_pool, &actor).await?))
}

// GET /api/auth/roles
pub async fn api_roles(Extension(actor): Extension<Actor>) -> Json<Vec<String>> {
    Json(actor.roles.names())
}

// --- HTML pages ---

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

// GET /login
pub async fn show_login_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> PageResult<Response> {
    let next = mw_auth::safe_next(query.next.as_deref()).to_string();
    if mw_auth::current_actor(&state, &session).await?.is_some() {
        tracing::debug!("GET /login: already logged in, redirecting to {}", next);
        return Ok(Redirect::to(&next).into_response());
    }

    let page = LoginPage {
        error: None,
        email: String::new(),
        next,
    };
    Ok(render(&page)?.into_response())
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    let next = mw_auth::safe_next(form.next.as_deref()).to_string();

    match auth_service::authenticate(&state.db_pool, &form.email, &form.password).await {
        Ok(user) => {
            start_session(&session, &user.id).await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(AppError::InvalidCredentials) => {
            let page = LoginPage {
                error: Some(AppError::InvalidCredentials.public_message()),
                email: form.email,
                next,
            };
            Ok((StatusCode::UNAUTHORIZED, render(&page)?).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> PageResult<Redirect> {
    let user_id: Option<String> = session.get(USER_ID_KEY).await.ok().flatten();
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to delete session: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 User '{}' logged out.", id),
        None => tracing::info!("🚪 Anonymous session closed."),
    }
    Ok(Redirect::to("/login"))
}
