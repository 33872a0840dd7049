//! HTTP Error Handling
//!
//! 所有业务错误都以 HTTP 200 + `{errno, error, data}` 返回

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound(_) => errno::NOT_FOUND,
            Self::BadRequest(_) => errno::BAD_REQUEST,
            Self::Conflict(_) => errno::CONFLICT,
            Self::Internal(_) => errno::INTERNAL_ERROR,
            Self::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg)
            | Self::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();

        match &self {
            // 校验失败属于用户可修正的输入问题，不按错误记录
            ApiError::BadRequest(_) => {
                tracing::debug!(errno = errno, error = %msg, "Request rejected");
            }
            ApiError::NotFound(_) | ApiError::Conflict(_) => {
                tracing::warn!(errno = errno, error = %msg, "Request failed");
            }
            ApiError::Internal(_) | ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno = errno, error = %msg, "Request failed");
            }
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::Validation(err) => ApiError::BadRequest(err.to_string()),
            ApplicationError::Synthesis(_) => ApiError::ServiceUnavailable(e.to_string()),
            ApplicationError::SessionNotFound(_) | ApplicationError::NotFound { .. } => {
                ApiError::NotFound(e.to_string())
            }
            ApplicationError::SessionClosed(_) => ApiError::Conflict(e.to_string()),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
