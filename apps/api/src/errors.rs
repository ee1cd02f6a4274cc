use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::bot::connector::ConnectorError;
use crate::notifications::NotifyError;
use crate::search::SearchError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Notification error: {0}")]
    Notification(NotifyError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<NotifyError> for AppError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::NoWinners => AppError::Validation(e.to_string()),
            NotifyError::TeamNotInstalled(_) => AppError::NotFound(e.to_string()),
            other => AppError::Notification(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Connector(e) => {
                tracing::error!("Connector error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONNECTOR_ERROR",
                    "Failed to reach the bot connector".to_string(),
                )
            }
            AppError::Search(e) => {
                tracing::error!("Search error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SEARCH_ERROR",
                    "A search error occurred".to_string(),
                )
            }
            AppError::Notification(e) => {
                tracing::error!("Notification error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFICATION_ERROR",
                    "Failed to send the notification".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::NotFound("award".into()), StatusCode::NOT_FOUND),
            (AppError::from(NotifyError::NoWinners), StatusCode::BAD_REQUEST),
            (
                AppError::Storage(StorageError::Service {
                    status: 503,
                    message: "busy".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
