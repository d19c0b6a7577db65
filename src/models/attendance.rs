// src/models/attendance.rs
use super::day::UtcDay;
use chrono::{DateTime, NaiveDate, Utc};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

pub const MAX_NOTES_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::validation(format!("Unknown attendance status '{}'.", s)))
    }
}

/// A row of `attendances`. `date` is the canonical UTC day, unique per (student, course).
#[derive(Debug, Clone, FromRow)]
pub struct Attendance {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceDto {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_number: String,
    pub course_id: i64,
    pub course_name: String,
    pub course_code: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAttendanceRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub date: UtcDay,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub date: UtcDay,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkAttendanceRequest {
    pub course_id: i64,
    pub date: UtcDay,
    pub student_attendances: Vec<StudentAttendanceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentAttendanceEntry {
    pub student_id: i64,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Result of a bulk submission. Students without an active enrollment are skipped, not failed.
#[derive(Debug, Serialize)]
pub struct BulkAttendanceOutcome {
    pub date: UtcDay,
    pub records: Vec<AttendanceDto>,
    pub skipped_student_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceFilter {
    pub date: Option<UtcDay>,
}

pub const ATTENDANCE_SELECT: &str = r#"
    SELECT
        a.id, a.student_id,
        su.first_name || ' ' || su.last_name AS student_name,
        s.student_number,
        a.course_id, c.course_name, c.course_code,
        a.teacher_id,
        tu.first_name || ' ' || tu.last_name AS teacher_name,
        a.date, a.status, a.notes, a.created_at
    FROM attendances a
    JOIN students s ON s.id = a.student_id
    JOIN users su ON su.id = s.user_id
    JOIN courses c ON c.id = a.course_id
    JOIN teachers t ON t.id = a.teacher_id
    JOIN users tu ON tu.id = t.user_id
"#;
