// src/web/mw_auth.rs
use crate::{
    access::Actor,
    error::{AppError, AppResult},
    services::user_service,
    state::AppState,
    templates::PageError,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Session key holding the logged-in user's id.
pub const USER_ID_KEY: &str = "user_id";

/// Reads the session and loads the caller. A session pointing at a deleted
/// user is flushed and treated as anonymous.
pub async fn current_actor(state: &AppState, session: &Session) -> AppResult<Option<Actor>> {
    let user_id = match session.get::<String>(USER_ID_KEY).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::error!("Auth MW: failed to read session: {:?}", e);
            return Err(AppError::SessionError(format!("Failed to read session: {}", e)));
        }
    };

    match user_service::load_actor(&state.db_pool, &user_id).await? {
        Some(actor) => Ok(Some(actor)),
        None => {
            tracing::warn!("Auth MW: session user '{}' no longer exists, flushing.", user_id);
            session
                .flush()
                .await
                .map_err(|e| AppError::SessionError(format!("Failed to flush session: {}", e)))?;
            Ok(None)
        }
    }
}

/// API guard: 401 JSON when nobody is logged in.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match current_actor(&state, &session).await? {
        Some(actor) => {
            tracing::debug!("Auth MW: '{}' authenticated with {:?}", actor.user_id, actor.roles);
            request.extensions_mut().insert(actor);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Auth MW: no session for {}", request.uri().path());
            Err(AppError::Unauthorized)
        }
    }
}

/// Page guard: anonymous visitors go to the login form and come back afterwards.
pub async fn require_page_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, PageError> {
    match current_actor(&state, &session).await? {
        Some(actor) => {
            request.extensions_mut().insert(actor);
            Ok(next.run(request).await)
        }
        None => {
            let next_path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/dashboard".to_string());
            tracing::debug!("Auth MW: not authenticated, redirecting {} to /login", next_path);
            let target = format!("/login?next={}", urlencoding::encode(&next_path));
            Ok(Redirect::to(&target).into_response())
        }
    }
}

/// Only same-site absolute paths are honoured as a post-login target.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains("://") => path,
        _ => "/dashboard",
    }
}
