// src/db.rs
use crate::error::{AppError, AppResult};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Sqlite, Transaction,
};
use std::str::FromStr;
use std::time::Duration;

// SQLite result codes for constraint failures.
const SQLITE_CONSTRAINT: &str = "19";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

pub async fn create_db_pool(database_url: &str) -> AppResult<SqlitePool> {
    tracing::info!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations complete.");
    Ok(())
}

/// Opens a transaction holding the write lock from its first statement.
/// Deferred transactions that read before writing fail with SQLITE_BUSY when
/// another writer commits in between; `BEGIN IMMEDIATE` waits on the busy timeout instead.
pub async fn begin_write(db_pool: &SqlitePool) -> AppResult<Transaction<'static, Sqlite>> {
    Ok(db_pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// True when the storage layer rejected a write because of a UNIQUE or PRIMARY KEY constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                return true;
            }
            match db_err.code().as_deref() {
                Some(SQLITE_CONSTRAINT_UNIQUE) | Some(SQLITE_CONSTRAINT_PRIMARYKEY) => true,
                Some(SQLITE_CONSTRAINT) => db_err.message().contains("UNIQUE"),
                _ => false,
            }
        }
        _ => false,
    }
}

/// Turns a racing unique-constraint rejection into a `Conflict`, everything else stays a database error.
pub fn conflict_on_unique(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| {
        if is_unique_violation(&err) {
            tracing::warn!("Unique constraint rejected write: {}", message);
            AppError::conflict(message)
        } else {
            AppError::SqlxError(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE codes (id INTEGER PRIMARY KEY, code TEXT NOT NULL UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO codes (id, code) VALUES (1, 'A1')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn duplicate_unique_value_is_recognised() {
        let pool = scratch_pool().await;
        let err = sqlx::query("INSERT INTO codes (code) VALUES ('A1')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));

        let mapped = conflict_on_unique("Code already exists.")(err);
        assert!(matches!(mapped, AppError::Conflict(ref m) if m == "Code already exists."));
    }

    #[tokio::test]
    async fn duplicate_primary_key_is_recognised() {
        let pool = scratch_pool().await;
        let err = sqlx::query("INSERT INTO codes (id, code) VALUES (1, 'B2')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn other_failures_stay_database_errors() {
        let pool = scratch_pool().await;
        let err = sqlx::query("INSERT INTO codes (code) VALUES (NULL)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(!is_unique_violation(&err));
        assert!(matches!(
            conflict_on_unique("Code already exists.")(err),
            AppError::SqlxError(_)
        ));
    }

    #[tokio::test]
    async fn write_transactions_commit() {
        let pool = scratch_pool().await;
        let mut tx = begin_write(&pool).await.unwrap();
        sqlx::query("INSERT INTO codes (code) VALUES ('C3')")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM codes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
