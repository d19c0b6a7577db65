// src/templates.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{AttendanceDto, AttendanceStatus},
        course::{CourseDto, CourseStudentDto},
        enrollment::CourseEnrollmentDto,
        grade::GradeDto,
        student::StudentDto,
    },
    web::flash::Flash,
};
use askama::Template;
use axum::response::{Html, IntoResponse, Response};

/// Renders a page, turning a template failure into a logged 500.
pub fn render<T: Template>(page: &T) -> AppResult<Html<String>> {
    page.render().map(Html).map_err(|e| {
        tracing::error!("Failed to render template: {}", e);
        AppError::InternalServerError
    })
}

/// `AppError` answered as an HTML page, for the browser-facing routes.
#[derive(Debug)]
pub struct PageError(pub AppError);

pub type PageResult<T> = Result<T, PageError>;

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!("Page request failed: {:?}", self.0);
        } else {
            tracing::warn!("Page request rejected ({}): {}", status.as_u16(), self.0);
        }

        let page = ErrorPage {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.0.public_message(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (status, page.message).into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    pub email: String,
    // Where to go after a successful login.
    pub next: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub user_name: String,
    pub roles: String,
    pub is_admin: bool,
    pub is_teacher: bool,
    pub is_student: bool,
    pub courses: Vec<CourseDto>,
    pub enrollments: Vec<CourseEnrollmentDto>,
    pub grades: Vec<GradeDto>,
    pub attendance: Vec<AttendanceDto>,
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "course.html")]
pub struct CoursePage {
    pub course: CourseDto,
    pub roster: Vec<CourseStudentDto>,
    pub available: Vec<StudentDto>,
    pub grades: Vec<GradeDto>,
    pub attendance: Vec<AttendanceDto>,
    /// Day shown in the attendance table and preselected in the bulk form.
    pub day: String,
    /// Only the owning teacher may record attendance.
    pub can_record: bool,
    pub statuses: Vec<AttendanceStatus>,
    pub flash: Option<Flash>,
}
