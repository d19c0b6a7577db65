// tests/common/mod.rs
#![allow(dead_code)]

use sqlx::SqlitePool;
use student_automation::{
    access::Actor,
    config::BootstrapAdmin,
    db,
    models::{
        course::{CourseDto, CreateCourseRequest},
        enrollment::CreateEnrollmentRequest,
        student::{CreateStudentRequest, StudentDto},
        teacher::{CreateTeacherRequest, TeacherDto},
    },
    services::{course_service, enrollment_service, student_service, teacher_service, user_service},
};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@school.test";
pub const PASSWORD: &str = "secret-pass";

/// Fresh SQLite file in the temp dir with migrations applied.
pub async fn test_pool() -> SqlitePool {
    let path = std::env::temp_dir().join(format!("student_automation_{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    db::create_db_pool(&url).await.expect("test database")
}

pub async fn actor_for(pool: &SqlitePool, user_id: &str) -> Actor {
    user_service::load_actor(pool, user_id)
        .await
        .expect("load actor")
        .expect("actor exists")
}

pub async fn admin(pool: &SqlitePool) -> Actor {
    let bootstrap = BootstrapAdmin {
        email: ADMIN_EMAIL.to_string(),
        password: PASSWORD.to_string(),
    };
    user_service::ensure_bootstrap_admin(pool, &bootstrap)
        .await
        .expect("bootstrap admin");
    let user = user_service::find_user_by_email(pool, ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    actor_for(pool, &user.id).await
}

pub async fn teacher(pool: &SqlitePool, admin: &Actor, tag: &str) -> (TeacherDto, Actor) {
    let req = CreateTeacherRequest {
        employee_number: None,
        email: format!("{}@school.test", tag),
        password: PASSWORD.to_string(),
        first_name: "Teacher".to_string(),
        last_name: tag.to_string(),
        phone_number: None,
        address: None,
        date_of_birth: None,
        department: Some("Science".to_string()),
        title: None,
        hire_date: None,
    };
    let teacher = teacher_service::create_teacher(pool, admin, req)
        .await
        .expect("create teacher");
    let actor = actor_for(pool, &teacher.user_id).await;
    (teacher, actor)
}

pub fn student_request(tag: &str) -> CreateStudentRequest {
    CreateStudentRequest {
        student_number: None,
        email: format!("{}@school.test", tag),
        password: PASSWORD.to_string(),
        first_name: "Student".to_string(),
        last_name: tag.to_string(),
        phone_number: None,
        address: None,
        date_of_birth: None,
        department: None,
        year: Some(1),
    }
}

pub async fn student(pool: &SqlitePool, admin: &Actor, tag: &str) -> (StudentDto, Actor) {
    let student = student_service::create_student(pool, admin, student_request(tag))
        .await
        .expect("create student");
    let actor = actor_for(pool, &student.user_id).await;
    (student, actor)
}

pub async fn course(pool: &SqlitePool, admin: &Actor, code: &str, teacher_id: i64) -> CourseDto {
    let req = CreateCourseRequest {
        course_code: code.to_string(),
        course_name: format!("Course {}", code),
        description: None,
        credits: 3,
        teacher_id,
    };
    course_service::create_course(pool, admin, req)
        .await
        .expect("create course")
}

pub async fn enroll(pool: &SqlitePool, admin: &Actor, course_id: i64, student_id: i64) {
    let req = CreateEnrollmentRequest {
        student_id,
        comments: None,
    };
    enrollment_service::create_enrollment(pool, admin, course_id, req)
        .await
        .expect("enroll");
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
