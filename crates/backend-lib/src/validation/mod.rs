// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation.

use regex::Regex;
use std::sync::LazyLock;
use streamhub_common::{RegisterRequest, UpdateAccountRequest};
use thiserror::Error;

use crate::error::AppError;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_FULLNAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_URL_LENGTH: usize = 2048;

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.-]+$").expect("username regex"));
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid full name: {0}")]
    InvalidFullname(String),

    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required<'a>(field: &'static str, value: &'a str) -> ValidationResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(trimmed)
}

/// Validate a username (checked after lower-casing)
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = required("username", username)?.to_lowercase();
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !USERNAME_REGEX.is_match(&username) {
        return Err(ValidationError::InvalidUsername(
            "may contain only letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(username)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = required("email", email)?.to_lowercase();
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ValidationError::InvalidEmail("invalid email format".to_string()));
    }
    Ok(email)
}

/// Validate a password. Only presence and an upper bound are enforced.
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::Missing("password"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(password)
}

pub fn validate_fullname(fullname: &str) -> ValidationResult<String> {
    let fullname = required("fullname", fullname)?;
    if fullname.chars().count() > MAX_FULLNAME_LENGTH {
        return Err(ValidationError::InvalidFullname(format!(
            "cannot exceed {MAX_FULLNAME_LENGTH} characters"
        )));
    }
    Ok(fullname.to_string())
}

/// Validate a URL handed over by the media collaborator
pub fn validate_media_url(field: &'static str, url: &str) -> ValidationResult<String> {
    let url = required(field, url)?;
    if url.len() > MAX_URL_LENGTH || url.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidUrl(format!("{field} is not a valid URL")));
    }
    Ok(url.to_string())
}

/// Registration fields after validation and normalization
#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Validate a registration body
pub fn validate_registration(req: &RegisterRequest) -> ValidationResult<ValidRegistration> {
    let fullname = validate_fullname(&req.fullname)?;
    let email = validate_email(&req.email)?;
    let username = validate_username(&req.username)?;
    validate_password(&req.password)?;
    let avatar = validate_media_url("avatar", &req.avatar)?;
    let cover_image = match req.cover_image.as_deref() {
        Some(url) if !url.trim().is_empty() => Some(validate_media_url("coverImage", url)?),
        _ => None,
    };
    Ok(ValidRegistration {
        username,
        email,
        fullname,
        avatar,
        cover_image,
    })
}

/// Validate an account update; at least one field must be present
pub fn validate_account_update(
    req: &UpdateAccountRequest,
) -> ValidationResult<(Option<String>, Option<String>)> {
    if req.fullname.is_none() && req.email.is_none() {
        return Err(ValidationError::Missing("fullname or email"));
    }
    let fullname = req.fullname.as_deref().map(validate_fullname).transpose()?;
    let email = req.email.as_deref().map(validate_email).transpose()?;
    Ok((fullname, email))
}
