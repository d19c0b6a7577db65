// src/state.rs
use sqlx::SqlitePool;
use tower_cookies::Key;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    // Signs the one-shot flash cookie used by the HTML pages.
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, cookie_key: Key) -> Self {
        AppState { db_pool, cookie_key }
    }
}

impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}
