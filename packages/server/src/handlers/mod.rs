pub mod admin;
pub mod auth;
pub mod file;
pub mod objects;
pub mod viewer;

use crate::error::AppError;

pub async fn health() -> &'static str {
    "API is running"
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}
