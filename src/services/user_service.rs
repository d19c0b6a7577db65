// src/services/user_service.rs
use crate::{
    access::{Actor, Role, RoleSet},
    config::BootstrapAdmin,
    db,
    error::{AppError, AppResult},
    models::{
        user::{NewUser, User, UserDto},
        validate,
    },
    services::{auth_service, student_service, teacher_service},
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const USER_SELECT: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, phone_number, address,
           date_of_birth, created_at, updated_at
    FROM users
"#;

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by id: {}", user_id);
    let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = ?1", USER_SELECT))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by email: {}", email);
    let user = sqlx::query_as::<_, User>(&format!("{} WHERE email = ?1", USER_SELECT))
        .bind(email.trim())
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn get_user_roles(db_pool: &SqlitePool, user_id: &str) -> AppResult<RoleSet> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY role ASC")
            .bind(user_id)
            .fetch_all(db_pool)
            .await?;
    tracing::debug!("Roles for {}: {:?}", user_id, names);
    Ok(RoleSet::from_names(names))
}

/// Resolves a session's user id into the caller of the request.
/// `None` when the user no longer exists.
pub async fn load_actor(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<Actor>> {
    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    if exists.is_none() {
        return Ok(None);
    }

    let roles = get_user_roles(db_pool, user_id).await?;
    let student_id: Option<i64> = sqlx::query_scalar("SELECT id FROM students WHERE user_id = ?1")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    let teacher_id: Option<i64> = sqlx::query_scalar("SELECT id FROM teachers WHERE user_id = ?1")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;

    Ok(Some(Actor {
        user_id: user_id.to_string(),
        roles,
        student_id,
        teacher_id,
    }))
}

/// Validates identity fields, then inserts the user and its roles on `conn`.
/// Runs inside the caller's transaction so the profile row commits with it.
pub async fn insert_user(conn: &mut SqliteConnection, new_user: &NewUser, roles: &[Role]) -> AppResult<User> {
    let email = validate::email(&new_user.email)?;
    validate::password(&new_user.password)?;
    let first_name = validate::required_text("First name", &new_user.first_name, 100)?;
    let last_name = validate::required_text("Last name", &new_user.last_name, 100)?;
    let phone_number = validate::optional_text("Phone number", new_user.phone_number.as_deref(), 30)?;
    let address = validate::optional_text("Address", new_user.address.as_deref(), 200)?;

    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
        .bind(&email)
        .fetch_one(&mut *conn)
        .await?;
    if taken > 0 {
        tracing::warn!("User creation refused: email '{}' already exists.", email);
        return Err(AppError::conflict("User with this email already exists."));
    }

    let password_hash = auth_service::hash_password(&new_user.password).await?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        first_name,
        last_name,
        phone_number,
        address,
        date_of_birth: new_user.date_of_birth,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, phone_number,
                           address, date_of_birth, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone_number)
    .bind(&user.address)
    .bind(user.date_of_birth)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(db::conflict_on_unique("User with this email already exists."))?;

    for role in roles {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)")
            .bind(&user.id)
            .bind(role.as_str())
            .execute(&mut *conn)
            .await?;
    }

    tracing::info!("✅ User '{}' created with roles {:?}", user.email, roles);
    Ok(user)
}

/// Updates the identity part of a directory entry.
pub async fn update_identity(
    conn: &mut SqliteConnection,
    user_id: &str,
    first_name: &str,
    last_name: &str,
    phone_number: Option<&str>,
    address: Option<&str>,
    date_of_birth: Option<chrono::NaiveDate>,
) -> AppResult<()> {
    let first_name = validate::required_text("First name", first_name, 100)?;
    let last_name = validate::required_text("Last name", last_name, 100)?;
    let phone_number = validate::optional_text("Phone number", phone_number, 30)?;
    let address = validate::optional_text("Address", address, 200)?;

    let rows_affected = sqlx::query(
        r#"
        UPDATE users
        SET first_name = ?1, last_name = ?2, phone_number = ?3, address = ?4,
            date_of_birth = ?5, updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(phone_number)
    .bind(address)
    .bind(date_of_birth)
    .bind(Utc::now())
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Identity update failed: user '{}' not found.", user_id);
        return Err(AppError::not_found("User not found."));
    }
    Ok(())
}

/// Profile of the caller with roles and any student/teacher record.
pub async fn user_profile(db_pool: &SqlitePool, actor: &Actor) -> AppResult<UserDto> {
    let user = find_user_by_id(db_pool, &actor.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;

    let student = match actor.student_id {
        Some(id) => student_service::find_student(db_pool, id).await?,
        None => None,
    };
    let teacher = match actor.teacher_id {
        Some(id) => teacher_service::find_teacher(db_pool, id).await?,
        None => None,
    };

    Ok(UserDto {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        phone_number: user.phone_number,
        address: user.address,
        date_of_birth: user.date_of_birth,
        roles: actor.roles.names(),
        student,
        teacher,
    })
}

/// Creates the configured administrator on first start.
pub async fn ensure_bootstrap_admin(db_pool: &SqlitePool, admin: &BootstrapAdmin) -> AppResult<()> {
    if find_user_by_email(db_pool, &admin.email).await?.is_some() {
        tracing::debug!("Bootstrap admin '{}' already present.", admin.email);
        return Ok(());
    }

    let new_user = NewUser {
        email: admin.email.clone(),
        password: admin.password.clone(),
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        ..NewUser::default()
    };

    let mut tx = db::begin_write(db_pool).await?;
    insert_user(&mut *tx, &new_user, &[Role::Admin]).await?;
    tx.commit().await?;
    tracing::info!("👤 Bootstrap admin '{}' created.", admin.email);
    Ok(())
}
