use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors raised while scanning one asset. Any of these aborts the whole
/// cycle; the next scheduled cycle proceeds independently.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("data fetch error: {0}")]
    DataFetch(String),
    #[error("data format error: {0}")]
    DataFormat(String),
    #[error("computation error: {0}")]
    Computation(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ScanError::DataFormat(error.to_string())
        } else {
            ScanError::DataFetch(error.to_string())
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Upstream(message) => (StatusCode::BAD_GATEWAY, message.clone()),
            AppError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        let body = Json(ErrorResponse { message });
        (status, body).into_response()
    }
}

impl From<ScanError> for AppError {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::DataFetch(message) | ScanError::DataFormat(message) => {
                AppError::Upstream(message)
            }
            ScanError::Computation(message) => AppError::Internal(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error.to_string())
    }
}
