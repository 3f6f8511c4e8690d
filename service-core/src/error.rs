use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(anyhow::Error),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Failure reported by an upstream collaborator; the message is relayed to the caller.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Upstream(_) | AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let status = self.status();
        let message = match self {
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                "Internal server error".to_string()
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                "Configuration error".to_string()
            }
            AppError::ServiceUnavailable => "Service unavailable".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
