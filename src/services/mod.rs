// src/services/mod.rs
pub mod attendance_service;
pub mod auth_service;
pub mod course_service;
pub mod enrollment_service;
pub mod grade_service;
pub mod numbering;
pub mod student_service;
pub mod teacher_service;
pub mod user_service;
