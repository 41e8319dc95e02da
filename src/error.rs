use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::ParseError;

/// Failure of one pass through the analysis pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Invalid(String),

    #[error("LLM request failed: {0:#}")]
    Llm(anyhow::Error),

    #[error("could not parse model output: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("LLM request failed: {0:#}")]
    Llm(anyhow::Error),

    #[error(transparent)]
    Parse(ParseError),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Invalid(message) => ApiError::Validation(message),
            PipelineError::Llm(e) => ApiError::Llm(e),
            PipelineError::Parse(e) => ApiError::Parse(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Llm(_) | ApiError::Parse(_) | ApiError::Internal(_) => {
                // Detail goes to the log only
                tracing::error!("request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
