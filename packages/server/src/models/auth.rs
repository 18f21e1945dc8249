use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user::{self, Role};
use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (1-100 characters).
    #[schema(example = "Alice")]
    pub name: String,
    /// Unique email address.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (1-128 characters).
    #[schema(example = "pw123")]
    pub password: String,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    if email.len() > 254 {
        return Err(AppError::Validation("Email must be at most 254 characters".into()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(AppError::Validation("Email is not a valid address".into())),
    }
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::Validation("All fields are required".into()));
    }
    if payload.name.trim().chars().count() > 100 {
        return Err(AppError::Validation("Name must be 1-100 characters".into()));
    }
    validate_email(&payload.email)?;
    if payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "pw123")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    }
    Ok(())
}

/// Public view of a user. Never carries the password hash.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "User created successfully")]
    pub message: String,
    pub user: UserResponse,
}
