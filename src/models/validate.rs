// src/models/validate.rs
use crate::error::{AppError, AppResult};

/// Trims a required text field and enforces its maximum length.
pub fn required_text(field: &str, value: &str, max_len: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required.", field)));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters.",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

/// Blank optional text becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max_len: usize) -> AppResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max_len => Err(AppError::validation(format!(
            "{} must be at most {} characters.",
            field, max_len
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

pub fn email(value: &str) -> AppResult<String> {
    let value = required_text("Email", value, 256)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid && !value.contains(char::is_whitespace) {
        Ok(value.to_lowercase())
    } else {
        Err(AppError::validation("Email address is not valid."))
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn password(value: &str) -> AppResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
