// src/models/student.rs
use super::day::UtcDay;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student profile joined with its owning user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentDto {
    pub id: i64,
    pub student_number: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_date: DateTime<Utc>,
    pub department: Option<String>,
    pub year: Option<i64>,
    pub is_active: bool,
}

impl StudentDto {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    #[serde(default)]
    pub student_number: Option<String>,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<UtcDay>,
    pub department: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<UtcDay>,
    pub department: Option<String>,
    pub year: Option<i64>,
    pub is_active: bool,
}

/// Profile columns of a new student, after validation.
#[derive(Debug, Clone, Default)]
pub struct NewStudentProfile {
    pub student_number: Option<String>,
    pub department: Option<String>,
    pub year: Option<i64>,
}

pub const STUDENT_SELECT: &str = r#"
    SELECT
        s.id, s.student_number, s.user_id,
        u.first_name, u.last_name, u.email, u.phone_number, u.address, u.date_of_birth,
        s.enrollment_date, s.department, s.year, s.is_active
    FROM students s
    JOIN users u ON u.id = s.user_id
"#;
