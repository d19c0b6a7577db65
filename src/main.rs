// src/main.rs
use axum::serve;
use student_automation::{
    config::{Config, DEFAULT_LOG_FILTER},
    db,
    error::AppError,
    services::user_service,
    state::AppState,
    web,
};
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::trace::TraceLayer;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Key::from needs at least this many bytes of secret.
const MIN_SECRET_LEN: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Starting Student Automation server...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("❌ Invalid configuration: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // --- Database ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Failed to initialize the database: {}", e);
            return Err(anyhow::anyhow!("Failed to connect/migrate DB: {}", e));
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        user_service::ensure_bootstrap_admin(&db_pool, admin).await?;
    }

    // --- Sessions ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Failed to create session store: {}", e))?;
    session_store.migrate().await?;

    let cleanup_store = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = cleanup_store
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Session cleanup task failed: {:?}", e);
        }
    });
    tracing::info!("🧹 Session cleanup task started.");

    if config.session_secret.len() < MIN_SECRET_LEN {
        tracing::error!("❌ SESSION_SECRET must be at least {} bytes long.", MIN_SECRET_LEN);
        return Err(AppError::Config(format!(
            "SESSION_SECRET must be at least {} bytes",
            MIN_SECRET_LEN
        ))
        .into());
    }
    let cookie_key = Key::from(config.session_secret.as_bytes());

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::hours(config.session_ttl_hours)));
    tracing::info!("🔑 Session layer configured.");

    let app_state = AppState::new(db_pool, cookie_key);

    // --- Listener ---
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Failed to bind {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Listening on http://{}", config.bind_addr);

    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CookieManagerLayer::new())
            .layer(session_layer),
    );

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Fatal server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
