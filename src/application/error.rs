use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::schemas::ImportResponse;
use crate::services::import::ImportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Partial check report with a `detail` message added
fn report_response(status: StatusCode, response: &ImportResponse, message: String) -> Response {
    let mut body = serde_json::to_value(response)
        .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
    if let Some(obj) = body.as_object_mut() {
        obj.insert("detail".to_string(), serde_json::Value::String(message));
    }
    (status, Json(body)).into_response()
}

fn import_error_response(err: ImportError) -> Response {
    let (status, message) = match err {
        ImportError::ChecksFailed { message, response } => {
            return report_response(StatusCode::BAD_REQUEST, &response, message);
        }
        ImportError::StorageFailed { check, response } => {
            let message = format!("Check {} failed: storage error", check);
            tracing::error!("Import aborted: {}", message);
            return report_response(StatusCode::INTERNAL_SERVER_ERROR, &response, message);
        }
        ImportError::Validation(msg) | ImportError::InvalidState(msg) => {
            (StatusCode::BAD_REQUEST, msg)
        }
        e @ ImportError::Parse(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        e @ ImportError::UniverseNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        ImportError::StateConflict(msg) => (StatusCode::CONFLICT, msg),
        ImportError::Persistence(e) => {
            tracing::error!("Database error during import: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        }
    };

    (status, Json(ErrorResponse { detail: message })).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Import(e) => return import_error_response(e),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Yaml(e) => {
                tracing::error!("YAML error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("YAML error: {}", e),
                )
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("IO error: {}", e))
            }
        };

        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
