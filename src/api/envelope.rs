//! JSON envelopes wrapped around every API response, and the error type
//! handlers return.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::error::CaseError;

/// Text of every 500 response. Details go to the log only.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataEnvelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// `{ "success": true, "message": "..." }`
#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}

impl MessageEnvelope {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// `{ "success": false, "error": "..." }`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Case not found")]
    CaseNotFound,

    #[error("Invalid case id")]
    InvalidId,

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Route not found")]
    RouteNotFound,

    #[error("Something went wrong")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::CaseNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidId | ApiError::InvalidBody(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::InvalidId(_) => ApiError::InvalidId,
            CaseError::NotFound(_) => ApiError::CaseNotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidBody(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Internal(detail) => error!(%detail, "request failed"),
            ApiError::InvalidBody(detail) => warn!(%detail, "rejected request body"),
            _ => {}
        }
        (status, Json(ErrorEnvelope::new(self.to_string()))).into_response()
    }
}

/// Response for a handler that panicked.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::new(GENERIC_ERROR)),
    )
        .into_response()
}
