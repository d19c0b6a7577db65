// src/models/mod.rs
pub mod attendance;
pub mod course;
pub mod day;
pub mod enrollment;
pub mod grade;
pub mod student;
pub mod teacher;
pub mod user;
pub mod validate;
