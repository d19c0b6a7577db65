// src/models/teacher.rs
use super::day::UtcDay;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A teacher profile joined with its owning user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeacherDto {
    pub id: i64,
    pub employee_number: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub hire_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeacherRequest {
    #[serde(default)]
    pub employee_number: Option<String>,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<UtcDay>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub hire_date: Option<UtcDay>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeacherRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<UtcDay>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewTeacherProfile {
    pub employee_number: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

pub const TEACHER_SELECT: &str = r#"
    SELECT
        t.id, t.employee_number, t.user_id,
        u.first_name, u.last_name, u.email, u.phone_number, u.address, u.date_of_birth,
        t.department, t.title, t.hire_date, t.is_active
    FROM teachers t
    JOIN users u ON u.id = t.user_id
"#;
