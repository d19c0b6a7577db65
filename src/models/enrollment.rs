// src/models/enrollment.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Dropped,
    Completed,
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnrollmentStatus::Active => "Active",
            EnrollmentStatus::Dropped => "Dropped",
            EnrollmentStatus::Completed => "Completed",
        };
        f.write_str(name)
    }
}

/// One row per (student, course); dropping flips the status instead of deleting.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseEnrollmentDto {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_number: String,
    pub course_id: i64,
    pub course_name: String,
    pub course_code: String,
    pub credits: i64,
    pub teacher_name: String,
    pub enrollment_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub student_id: i64,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddStudentsRequest {
    pub student_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddStudentsResponse {
    pub message: String,
    pub enrolled: usize,
}

pub const ENROLLMENT_SELECT: &str = r#"
    SELECT
        ce.id, ce.student_id,
        su.first_name || ' ' || su.last_name AS student_name,
        s.student_number,
        ce.course_id, c.course_name, c.course_code, c.credits,
        tu.first_name || ' ' || tu.last_name AS teacher_name,
        ce.enrollment_date, ce.status, ce.comments
    FROM course_enrollments ce
    JOIN students s ON s.id = ce.student_id
    JOIN users su ON su.id = s.user_id
    JOIN courses c ON c.id = ce.course_id
    JOIN teachers t ON t.id = c.teacher_id
    JOIN users tu ON tu.id = t.user_id
"#;
