use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset error: {0}")]
    Data(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch in {stage}: expected {expected} features, got {actual}")]
    DimensionMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Artifact error: {0}")]
    Artifact(String),
}

impl AppError {
    pub fn dimension_mismatch(stage: &'static str, expected: usize, actual: usize) -> Self {
        AppError::DimensionMismatch {
            stage,
            expected,
            actual,
        }
    }
}

// Schema errors keep the extractor's status (400, 415 or 422).
// Transform errors map to 400. No trace detail either way.
#[derive(Debug)]
pub enum ApiError {
    Schema(JsonRejection),
    Transform(AppError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Schema(rejection)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::Transform(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Schema(rejection) => {
                tracing::debug!("Rejected request payload: {}", rejection.body_text());
                (rejection.status(), rejection.body_text())
            }
            ApiError::Transform(err) => {
                tracing::warn!("Prediction failed: {}", err);
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

// Helper function for creating validation errors
pub fn validation_error(msg: &str) -> AppError {
    AppError::InvalidInput(msg.to_string())
}
