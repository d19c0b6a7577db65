// src/services/auth_service.rs
use crate::{
    access::Role,
    db,
    error::{AppError, AppResult},
    models::{
        student::NewStudentProfile,
        teacher::NewTeacherProfile,
        user::{NewUser, RegisterRequest, User},
        validate,
    },
    services::{numbering::OnCollision, student_service, teacher_service, user_service},
};
use sqlx::SqlitePool;

/// Checks a password against its stored bcrypt hash.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verifying bcrypt hash...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("spawn_blocking failed (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("bcrypt verify failed: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Produces a bcrypt hash for a new password.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Generating bcrypt hash...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("spawn_blocking failed (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("bcrypt hash failed: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Email + password check. Unknown email and wrong password look the same to the caller.
pub async fn authenticate(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<User> {
    let user = match user_service::find_user_by_email(db_pool, email).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Login failed: no user for '{}'", email);
            return Err(AppError::InvalidCredentials);
        }
    };

    if verify_password(password, &user.password_hash).await? {
        tracing::info!("✅ Login succeeded for {}", user.email);
        Ok(user)
    } else {
        tracing::warn!("Login failed: wrong password for '{}'", email);
        Err(AppError::InvalidCredentials)
    }
}

/// Self-service registration for students and teachers.
pub async fn register(db_pool: &SqlitePool, req: RegisterRequest) -> AppResult<User> {
    let role: Role = req.role.parse()?;
    if role == Role::Admin {
        return Err(AppError::validation(
            "Only Student or Teacher accounts can be registered.",
        ));
    }
    validate::password(&req.password)?;
    if req.password != req.confirm_password {
        return Err(AppError::validation("Passwords do not match."));
    }

    let new_user = NewUser {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
        address: req.address,
        date_of_birth: req.date_of_birth.map(|d| d.date()),
    };

    let mut tx = db::begin_write(db_pool).await?;
    let user = user_service::insert_user(&mut *tx, &new_user, &[role]).await?;

    if role == Role::Student {
        let profile = NewStudentProfile {
            student_number: req.student_number,
            department: req.department,
            year: req.year,
        };
        // A taken number on self-registration is replaced, not refused.
        student_service::insert_profile(&mut *tx, &user.id, &profile, OnCollision::Regenerate).await?;
    } else {
        let profile = NewTeacherProfile {
            employee_number: req.employee_number,
            department: req.department,
            title: req.title,
            hire_date: None,
        };
        teacher_service::insert_profile(&mut *tx, &user.id, &profile, OnCollision::Reject).await?;
    }

    tx.commit().await?;
    tracing::info!("📝 Registered {} as {}", user.email, role);
    Ok(user)
}
