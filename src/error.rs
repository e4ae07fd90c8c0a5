use std::fmt::Display;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("metadata provider error: {0}")]
    Upstream(String),

    #[error("{0} not found")]
    NotFound(String),

    // `value` is echoed back so the caller can refill its form.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, value: String, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: &str, id: impl Display) -> Self {
        Self::NotFound(format!("{resource} {id}"))
    }

    pub fn validation(
        field: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation { field, value: value.into(), message: message.into() }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation { field, value, message } => json!({
                "error": self.to_string(),
                "field": field,
                "value": value,
                "message": message,
            }),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "metadata provider failure");
                json!({ "error": "movie service is unavailable" })
            },
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                json!({ "error": "a database error occurred" })
            },
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                json!({ "error": "an internal error occurred" })
            },
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("body", String::new(), rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
