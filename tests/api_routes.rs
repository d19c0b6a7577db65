// tests/api_routes.rs
mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use student_automation::{state::AppState, web::routes::create_router};
use tower::ServiceExt;
use tower_cookies::{CookieManagerLayer, Key};
use tower_sessions::{MemoryStore, SessionManagerLayer};

fn app(pool: SqlitePool) -> Router {
    create_router(AppState::new(pool, Key::from(&[7u8; 64])))
        .layer(CookieManagerLayer::new())
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Logs in through the API and returns the session cookie pair.
async fn login(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": email, "password": common::PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("id="))
        .expect("session cookie")
        .to_string();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn api_without_session_is_unauthorized_json() {
    let pool = common::test_pool().await;
    let response = app(pool).oneshot(get("/api/courses", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_then_profile_shows_roles() {
    let pool = common::test_pool().await;
    common::admin(&pool).await;
    let app = app(pool);

    let cookie = login(&app, common::ADMIN_EMAIL).await;
    let response = app
        .clone()
        .oneshot(get("/api/auth/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], common::ADMIN_EMAIL);
    assert_eq!(body["roles"], json!(["Admin"]));

    let response = app.oneshot(get("/api/auth/roles", Some(&cookie))).await.unwrap();
    assert_eq!(body_json(response).await, json!(["Admin"]));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let pool = common::test_pool().await;
    common::admin(&pool).await;
    let response = app(pool)
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": common::ADMIN_EMAIL, "password": "not-the-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn student_cannot_list_the_directory() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    common::student(&pool, &admin, "sam").await;
    let app = app(pool);

    let cookie = login(&app, "sam@school.test").await;
    let response = app
        .clone()
        .oneshot(get("/api/students", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get("/api/students/my-profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["student_number"].is_string());
}

#[tokio::test]
async fn admin_creates_a_course_over_http() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let app = app(pool);
    let cookie = login(&app, common::ADMIN_EMAIL).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/courses",
            Some(&cookie),
            json!({
                "course_code": "CHEM1",
                "course_name": "Chemistry",
                "credits": 4,
                "teacher_id": teacher.id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "NotStarted");
    assert_eq!(body["enrolled_students_count"], 0);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/courses",
            Some(&cookie),
            json!({
                "course_code": "CHEM1",
                "course_name": "Chemistry again",
                "credits": 4,
                "teacher_id": teacher.id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn anonymous_dashboard_redirects_to_login() {
    let pool = common::test_pool().await;
    let response = app(pool).oneshot(get("/dashboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login?next=%2Fdashboard"
    );
}

#[tokio::test]
async fn login_page_renders() {
    let pool = common::test_pool().await;
    let response = app(pool)
        .oneshot(get("/login?next=/dashboard/courses/1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains(r#"name="next""#));
    assert!(html.contains("courses"));
}

#[tokio::test]
async fn malformed_json_body_is_a_validation_error() {
    let pool = common::test_pool().await;
    let admin = common::admin(&pool).await;
    let (teacher, _) = common::teacher(&pool, &admin, "tina").await;
    let (student, _) = common::student(&pool, &admin, "sam").await;
    let course = common::course(&pool, &admin, "BIO101", teacher.id).await;
    common::enroll(&pool, &admin, course.id, student.id).await;
    let app = app(pool);
    let cookie = login(&app, "tina@school.test").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/attendance",
            Some(&cookie),
            json!({
                "student_id": student.id,
                "course_id": course.id,
                "date": "yesterday",
                "status": "Present",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("yesterday"));
}

#[tokio::test]
async fn bad_path_and_query_values_are_validation_errors() {
    let pool = common::test_pool().await;
    common::admin(&pool).await;
    let app = app(pool);
    let cookie = login(&app, common::ADMIN_EMAIL).await;

    let response = app
        .clone()
        .oneshot(get("/api/courses/abc", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = app
        .oneshot(get("/api/attendance/course/1?date=someday", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn page_errors_render_as_html() {
    let pool = common::test_pool().await;
    common::admin(&pool).await;
    let app = app(pool);
    let cookie = login(&app, common::ADMIN_EMAIL).await;

    let response = app
        .oneshot(get("/dashboard/courses/999", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Course not found."));
}
