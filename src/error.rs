use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("{0}")]
    MissingFields(String),
    #[error("Image generation failed: {0}")]
    ImageUnavailable(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StoryError {
    /// Whether a transport-level retry can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoryError::RequestError(_) => true,
            StoryError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoryError {
    fn from(e: serde_json::Error) -> Self {
        StoryError::SerializationError(e.to_string())
    }
}

impl From<reqwest::Error> for StoryError {
    fn from(e: reqwest::Error) -> Self {
        StoryError::RequestError(e.to_string())
    }
}

impl ResponseError for StoryError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoryError::MissingFields(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            StoryError::MissingFields(msg) => {
                HttpResponse::BadRequest().json(json!({ "error": msg }))
            }
            other => HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error",
                "detail": other.to_string(),
            })),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoryError::RequestError("timeout".into()).is_retryable());
        assert!(StoryError::ApiError { status: 429, message: "slow down".into() }.is_retryable());
        assert!(StoryError::ApiError { status: 503, message: "busy".into() }.is_retryable());
        assert!(!StoryError::ApiError { status: 400, message: "bad".into() }.is_retryable());
        assert!(!StoryError::ResponseError("empty".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StoryError::MissingFields("name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StoryError::InternalError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
