// src/models/course.rs
use super::enrollment::EnrollmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum CourseStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CourseStatus::NotStarted => "Not started",
            CourseStatus::InProgress => "In progress",
            CourseStatus::Completed => "Completed",
            CourseStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// A row of the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseDto {
    pub id: i64,
    pub course_code: String,
    pub course_name: String,
    pub description: Option<String>,
    pub credits: i64,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub enrolled_students_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub course_code: String,
    pub course_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub credits: i64,
    pub teacher_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub course_name: String,
    pub description: Option<String>,
    pub credits: i64,
    pub status: CourseStatus,
}

/// One line of a course roster.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseStudentDto {
    pub id: i64,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrollment_date: DateTime<Utc>,
    pub enrollment_status: EnrollmentStatus,
    pub course_id: i64,
    pub course_name: String,
    pub course_code: String,
}

pub const MAX_CREDITS: i64 = 30;

pub const COURSE_SELECT: &str = r#"
    SELECT
        c.id, c.course_code, c.course_name, c.description, c.credits, c.teacher_id,
        u.first_name || ' ' || u.last_name AS teacher_name,
        c.status, c.created_at, c.updated_at,
        (SELECT COUNT(*) FROM course_enrollments ce
          WHERE ce.course_id = c.id AND ce.status = 'Active') AS enrolled_students_count
    FROM courses c
    JOIN teachers t ON t.id = c.teacher_id
    JOIN users u ON u.id = t.user_id
"#;
