use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PmseekError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("{service} returned HTTP {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PmseekError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PmseekError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, PmseekError>;

/// Error returned from HTTP handlers. Renders as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub PmseekError);

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(PmseekError::InvalidInput(msg.into()))
    }
}

impl From<PmseekError> for ApiError {
    fn from(err: PmseekError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let message = self.0.to_string();

        if status.is_server_error() {
            error!(error = %message, "Request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
