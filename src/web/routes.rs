// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        attendance_handlers, auth_handlers, course_handlers, grade_handlers, mw_auth, page_handlers,
        student_handlers, teacher_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Public routes ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/", get(|| async { axum::response::Redirect::to("/dashboard") }))
        .route("/api/auth/login", post(auth_handlers::api_login))
        .route("/api/auth/register", post(auth_handlers::api_register))
        .route("/api/auth/logout", post(auth_handlers::api_logout));

    // --- JSON API, 401 without a session ---
    let student_routes = Router::new()
        .route("/", get(student_handlers::list).post(student_handlers::create))
        .route("/my-profile", get(student_handlers::my_profile))
        .route(
            "/{id}",
            get(student_handlers::get)
                .put(student_handlers::update)
                .delete(student_handlers::delete),
        )
        .route("/{id}/courses", get(student_handlers::courses))
        .route("/{id}/grades", get(student_handlers::grades));

    let teacher_routes = Router::new()
        .route("/", get(teacher_handlers::list).post(teacher_handlers::create))
        .route("/my-profile", get(teacher_handlers::my_profile))
        .route(
            "/{id}",
            get(teacher_handlers::get)
                .put(teacher_handlers::update)
                .delete(teacher_handlers::delete),
        )
        .route("/{id}/courses", get(teacher_handlers::courses));

    let course_routes = Router::new()
        .route("/", get(course_handlers::list).post(course_handlers::create))
        .route("/my-courses", get(course_handlers::my_courses))
        .route("/my-teacher-courses", get(course_handlers::my_teacher_courses))
        .route(
            "/{id}",
            get(course_handlers::get)
                .put(course_handlers::update)
                .delete(course_handlers::delete),
        )
        .route("/{id}/students", get(course_handlers::students))
        .route("/{id}/available-students", get(course_handlers::available_students))
        .route("/{id}/enroll", post(course_handlers::enroll))
        .route("/{id}/add-students", post(course_handlers::add_students))
        .route(
            "/{id}/students/{student_id}",
            axum::routing::delete(course_handlers::drop_student),
        );

    let grade_routes = Router::new()
        .route("/", get(grade_handlers::list).post(grade_handlers::create))
        .route("/my-grades", get(grade_handlers::my_grades))
        .route("/my-grades/{course_id}", get(grade_handlers::my_course_grades))
        .route("/course/{course_id}", get(grade_handlers::by_course))
        .route(
            "/{id}",
            get(grade_handlers::get)
                .put(grade_handlers::update)
                .delete(grade_handlers::delete),
        );

    let attendance_routes = Router::new()
        .route("/", get(attendance_handlers::list).post(attendance_handlers::create))
        .route("/bulk", post(attendance_handlers::bulk))
        .route("/my-attendance", get(attendance_handlers::my_attendance))
        .route("/course/{course_id}", get(attendance_handlers::by_course))
        .route(
            "/{id}",
            get(attendance_handlers::get)
                .put(attendance_handlers::update)
                .delete(attendance_handlers::delete),
        );

    let api_routes = Router::new()
        .route("/auth/profile", get(auth_handlers::api_profile))
        .route("/auth/roles", get(auth_handlers::api_roles))
        .nest("/students", student_routes)
        .nest("/teachers", teacher_routes)
        .nest("/courses", course_routes)
        .nest("/grades", grade_routes)
        .nest("/attendance", attendance_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- HTML pages, redirect to /login without a session ---
    let page_routes = Router::new()
        .route("/dashboard", get(page_handlers::dashboard))
        .route("/dashboard/courses/{id}", get(page_handlers::course_page))
        .route("/dashboard/courses/{id}/enroll", post(page_handlers::handle_enroll))
        .route(
            "/dashboard/courses/{id}/students/{student_id}/drop",
            post(page_handlers::handle_drop),
        )
        .route("/dashboard/courses/{id}/attendance", post(page_handlers::handle_bulk_attendance))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_page_auth,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .merge(page_routes)
        .with_state(app_state)
}
