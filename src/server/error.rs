//! HTTP error mapping
//!
//! Caller-fixable failures surface with their message; everything else is
//! logged in full and answered with a fixed generic detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::constants::server::INTERNAL_FAILURE_DETAIL;
use crate::types::GuardError;

pub enum AppError {
    /// 400 with the message shown to the caller
    BadRequest(String),
    /// Body failed to deserialize; status chosen by the extractor
    Rejected(StatusCode, String),
    /// 500; the error is logged, never returned
    Internal(GuardError),
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        if err.is_caller_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rejected(status, msg) => (status, msg),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Neural prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_FAILURE_DETAIL.to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
