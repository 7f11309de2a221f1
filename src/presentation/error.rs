// Handler errors rendered as JSON responses
use crate::application::filter_cascade::CascadeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Views never fail on upstream API errors: services degrade to fallback
/// views instead. Only downloads, which have no fallback, surface them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Cascade(#[from] CascadeError),

    #[error("Unknown metric {0}")]
    UnknownMetric(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Cascade(CascadeError::InvalidTransition { .. }) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Cascade(CascadeError::Defaults(msg)) => {
                tracing::error!(error = %msg, "Saving filter defaults failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            AppError::UnknownMetric(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY")
            }
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
