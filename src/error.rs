/*
 * Responsibility
 * - Gateway-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Auth rejections and upstream failures share the same error envelope
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AuthError;
use crate::services::upstream::ProxyError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed request path")]
    BadRequest,
    #[error("{0}")]
    Unauthorized(AuthError),
    #[error("upstream unavailable")]
    BadGateway,
    #[error("upstream timed out")]
    GatewayTimeout,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::BadRequest => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::BadGateway => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            AppError::GatewayTimeout => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT"),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e)
    }
}

impl From<ProxyError> for AppError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::Timeout(_) => AppError::GatewayTimeout,
            ProxyError::Upstream(_) => AppError::BadGateway,
            ProxyError::InvalidUri => AppError::Internal,
        }
    }
}
