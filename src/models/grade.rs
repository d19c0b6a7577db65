// src/models/grade.rs
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;
pub const MAX_EXAM_TYPE_LEN: usize = 100;
pub const MAX_COMMENTS_LEN: usize = 500;

/// A row of the `grades` table. Several exam types per student and course are allowed.
#[derive(Debug, Clone, FromRow)]
pub struct Grade {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub exam_type: String,
    pub score: f64,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GradeDto {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_number: String,
    pub course_id: i64,
    pub course_name: String,
    pub course_code: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub exam_type: String,
    pub score: f64,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub exam_type: String,
    pub score: f64,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGradeRequest {
    pub exam_type: String,
    pub score: f64,
    pub comments: Option<String>,
}

/// Checks the score range and rounds to the two decimals the column keeps.
pub fn validate_score(score: f64) -> AppResult<f64> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(AppError::validation(format!(
            "Score must be between {} and {}.",
            MIN_SCORE, MAX_SCORE
        )));
    }
    Ok((score * 100.0).round() / 100.0)
}

pub const GRADE_SELECT: &str = r#"
    SELECT
        g.id, g.student_id,
        su.first_name || ' ' || su.last_name AS student_name,
        s.student_number,
        g.course_id, c.course_name, c.course_code,
        g.teacher_id,
        tu.first_name || ' ' || tu.last_name AS teacher_name,
        g.exam_type, g.score, g.comments, g.created_at, g.updated_at
    FROM grades g
    JOIN students s ON s.id = g.student_id
    JOIN users su ON su.id = s.user_id
    JOIN courses c ON c.id = g.course_id
    JOIN teachers t ON t.id = g.teacher_id
    JOIN users tu ON tu.id = t.user_id
"#;
