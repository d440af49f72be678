//! API response and error types

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use printquote::QuoteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure of a quote request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("quote worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Quote(QuoteError::GeometryParse(_) | QuoteError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::Quote(QuoteError::Io(_)) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self, "quote request failed");
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
