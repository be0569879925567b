//! Error responses in the shape the frontend expects.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Handler errors.
///
/// Field errors serialize as `{"field": ["message", ...]}`, everything else
/// as `{"detail": "message"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("invalid fields: {0:?}")]
    Fields(BTreeMap<String, Vec<String>>),
    #[error("{1}")]
    Status(StatusCode, String),
}

impl ApiError {
    /// A single field error.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.to_string(), vec![message.into()]);
        ApiError::Fields(fields)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Fields(_) => StatusCode::BAD_REQUEST,
            ApiError::Status(status, _) => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound => json!({ "detail": "Не найдено." }),
            ApiError::Fields(fields) => json!(fields),
            ApiError::Status(_, detail) => json!({ "detail": detail }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Status(
            StatusCode::BAD_REQUEST,
            format!("JSON parse error - {}", rejection.body_text()),
        )
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Status(err.status(), err.body_text())
    }
}

/// Startup errors of the server binary.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
