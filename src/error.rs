//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::info;

use crate::providers::ProviderError;

/// definitions for the comickids application.
#[derive(Debug)]
pub enum ComicError {
    /// When you didn't do the right thing
    BadRequest(String),
    /// Missing or invalid CSRF token
    Unauthorized,
    /// When DB operations fail
    DatabaseError(sea_orm::DbErr),
    /// When a requested resource is not found
    NotFound(String),
    /// The text provider could not produce a script
    ScriptGeneration(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for ComicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "Bad request: {message}"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::DatabaseError(err) => write!(f, "Database error: {err}"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::ScriptGeneration(message) => {
                write!(f, "Failed to generate comic script: {message}")
            }
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for ComicError {}

impl From<sea_orm::DbErr> for ComicError {
    fn from(err: sea_orm::DbErr) -> Self {
        ComicError::DatabaseError(err)
    }
}

impl From<std::io::Error> for ComicError {
    fn from(err: std::io::Error) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ComicError {
    fn from(err: axum::http::Error) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<image::ImageError> for ComicError {
    fn from(err: image::ImageError) -> Self {
        ComicError::InternalServerError(format!("Image error: {err}"))
    }
}

impl From<tokio::task::JoinError> for ComicError {
    fn from(err: tokio::task::JoinError) -> Self {
        ComicError::InternalServerError(format!("Background task failed: {err}"))
    }
}

impl From<tower_sessions::session::Error> for ComicError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ComicError::InternalServerError(format!("Session error: {err}"))
    }
}

impl From<ProviderError> for ComicError {
    fn from(err: ProviderError) -> Self {
        ComicError::ScriptGeneration(err.to_string())
    }
}

fn error_body(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ComicError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ComicError::BadRequest(message) => {
                info!("Bad request received: {message}");
                error_body(StatusCode::BAD_REQUEST, &message)
            }
            ComicError::Unauthorized => {
                info!("Unauthorized request received");
                error_body(
                    StatusCode::FORBIDDEN,
                    "Invalid or missing CSRF token, reload the page and try again.",
                )
            }
            ComicError::DatabaseError(err) => {
                tracing::error!("Database error: {}", err);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            ComicError::NotFound(what) => {
                tracing::warn!("404 {what}");
                error_body(StatusCode::NOT_FOUND, "Not Found")
            }
            ComicError::ScriptGeneration(message) => {
                tracing::error!("Script generation failed: {}", message);
                error_body(StatusCode::BAD_GATEWAY, "Failed to generate comic script")
            }
            ComicError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}
