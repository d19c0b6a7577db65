// src/services/numbering.rs
//! Student and employee numbers: prefix + year + random digits.
//!
//! Generation is bounded: a first round of short candidates, then a round with
//! wider entropy, then a `Conflict`. The unique index still guards the final
//! insert against a racing writer.

use crate::error::{AppError, AppResult};
use chrono::{Datelike, Utc};
use rand::Rng;
use sqlx::SqliteConnection;

pub const ATTEMPTS_PER_ROUND: usize = 10;
const SHORT_DIGITS: u32 = 4;
const WIDE_DIGITS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Student,
    Employee,
}

impl NumberKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            NumberKind::Student => "STU",
            NumberKind::Employee => "EMP",
        }
    }

    fn exists_query(&self) -> &'static str {
        match self {
            NumberKind::Student => "SELECT COUNT(*) FROM students WHERE student_number = ?1",
            NumberKind::Employee => "SELECT COUNT(*) FROM teachers WHERE employee_number = ?1",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            NumberKind::Student => "Student number",
            NumberKind::Employee => "Employee number",
        }
    }
}

/// What to do when a caller-supplied number is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnCollision {
    Reject,
    Regenerate,
}

/// Every candidate a single generation may try, in order.
pub fn candidates<R: Rng>(kind: NumberKind, year: i32, rng: &mut R) -> Vec<String> {
    let mut out = Vec::with_capacity(ATTEMPTS_PER_ROUND * 2);
    for digits in [SHORT_DIGITS, WIDE_DIGITS] {
        let low = 10u64.pow(digits - 1);
        let high = 10u64.pow(digits);
        for _ in 0..ATTEMPTS_PER_ROUND {
            out.push(format!("{}{}{}", kind.prefix(), year, rng.gen_range(low..high)));
        }
    }
    out
}

async fn is_taken(conn: &mut SqliteConnection, kind: NumberKind, number: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar(kind.exists_query())
        .bind(number)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

pub async fn generate_unique(conn: &mut SqliteConnection, kind: NumberKind) -> AppResult<String> {
    let pool = candidates(kind, Utc::now().year(), &mut rand::thread_rng());
    for candidate in pool {
        if !is_taken(conn, kind, &candidate).await? {
            tracing::debug!("Generated {} '{}'", kind.label(), candidate);
            return Ok(candidate);
        }
    }
    tracing::error!("{} generation exhausted all candidates", kind.label());
    Err(AppError::conflict(format!(
        "Could not generate a unique {}.",
        kind.label().to_lowercase()
    )))
}

/// Returns the number to store: the requested one when free, otherwise per `on_collision`.
pub async fn resolve(
    conn: &mut SqliteConnection,
    kind: NumberKind,
    requested: Option<&str>,
    on_collision: OnCollision,
) -> AppResult<String> {
    let requested = requested.map(str::trim).filter(|n| !n.is_empty());
    let Some(number) = requested else {
        return generate_unique(conn, kind).await;
    };

    if number.chars().count() > 20 {
        return Err(AppError::validation(format!(
            "{} must be at most 20 characters.",
            kind.label()
        )));
    }
    if !is_taken(conn, kind, number).await? {
        return Ok(number.to_string());
    }

    match on_collision {
        OnCollision::Reject => Err(AppError::conflict(format!("{} already exists.", kind.label()))),
        OnCollision::Regenerate => {
            tracing::info!("{} '{}' taken, generating a new one.", kind.label(), number);
            generate_unique(conn, kind).await
        }
    }
}
