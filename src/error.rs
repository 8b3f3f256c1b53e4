//! Error types for the catalog service and its outbound clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Missing configuration detected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TWELVELABS_API_KEY is not set in environment variables")]
    MissingApiKey,

    #[error("Index IDs are not set in environment variables")]
    MissingIndexIds,
}

/// Failure talking to a remote listing (Twelve Labs or the storage service).
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Errors surfaced by the HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to fetch videos from TwelveLabs")]
    Aggregation { message: String, details: String },

    #[error("Upload is not available on this endpoint. Upload directly to the storage service instead.")]
    UploadNotAvailable,
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Aggregation {
            message: e.to_string(),
            details: format!("{:?}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.to_string();
        let (status, body) = match self {
            ApiError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(error)),
            ApiError::Aggregation { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error,
                    message: Some(message),
                    details: Some(details),
                },
            ),
            ApiError::UploadNotAvailable => (StatusCode::NOT_IMPLEMENTED, ErrorResponse::new(error)),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
