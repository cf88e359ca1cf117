use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::modules::chat::ApplicationError;
use crate::modules::config::ConfigError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ApplicationError> for AppError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::SessionNotFound(id) => AppError::SessionNotFound(id),
            ApplicationError::ValidationError(msg) => AppError::BadRequest(msg),
            ApplicationError::TransportUnavailable(e) => {
                AppError::TransportUnavailable(e.to_string())
            }
            other => AppError::Unknown(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TransportUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// HTTP 层错误响应
///
/// 只有 NotFound 和参数错误会暴露具体信息，其余统一为通用描述
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            AppError::SessionNotFound(_) | AppError::BadRequest(_) => self.to_string(),
            AppError::TransportUnavailable(_) => "Service temporarily unavailable".to_string(),
            _ => "Internal server error".to_string(),
        };

        if status.is_server_error() {
            tracing::error!("[AppError] {}", self);
        }

        (status, axum::Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
