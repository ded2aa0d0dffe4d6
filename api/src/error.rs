use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by the prediction service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A request field is missing, mistyped or out of range.
    #[error("{0}")]
    Validation(String),

    /// The model could not be loaded or failed while predicting.
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// A transaction or connection against the database failed.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    /// The serialized model artifact is absent.
    #[error("model artifact not found: {0}")]
    NotFound(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Validation(msg) => format!("validation error: {msg}"),
            other => {
                tracing::error!(error = %other, "request failed");
                format!("internal error: {other}")
            }
        };

        (
            status,
            Json(serde_json::json!({"error": message, "success": false})),
        )
            .into_response()
    }
}
