// src/web/mod.rs
pub mod attendance_handlers;
pub mod auth_handlers;
pub mod course_handlers;
pub mod extract;
pub mod flash;
pub mod grade_handlers;
pub mod mw_auth;
pub mod page_handlers;
pub mod routes;
pub mod student_handlers;
pub mod teacher_handlers;
