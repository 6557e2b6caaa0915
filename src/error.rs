//! 网关统一错误处理
//!
//! Every request failure ends up as one [`GatewayError`], which decides the
//! HTTP status and renders `{ "error": <category>, "details": <cause> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;
use crate::guard::AccessDenied;
use crate::token::TokenError;
use crate::upstream::UpstreamError;

/// 网关错误类型
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// 请求来源被拦截
    #[error(transparent)]
    Access(#[from] AccessDenied),

    /// 参数验证错误
    #[error("{0}")]
    Param(String),

    /// 令牌验证错误
    #[error(transparent)]
    Token(#[from] TokenError),

    /// 缓存后端错误，`CacheStore` 内部记录后丢弃，流水线不会返回
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// 上游翻译服务错误
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// 内部错误
    #[error("{0}")]
    Unknown(String),
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Access,
    Param,
    Token,
    Cache,
    Unknown,
}

impl GatewayError {
    pub fn param<T: std::fmt::Display>(msg: T) -> Self {
        GatewayError::Param(msg.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Access(_) => ErrorKind::Access,
            GatewayError::Param(_) => ErrorKind::Param,
            GatewayError::Token(_) => ErrorKind::Token,
            GatewayError::Cache(_) => ErrorKind::Cache,
            GatewayError::Upstream(_) | GatewayError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Access(_) => StatusCode::FORBIDDEN,
            GatewayError::Param(_) => StatusCode::BAD_REQUEST,
            GatewayError::Token(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Upstream(e) => e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            GatewayError::Cache(_) | GatewayError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message for the `error` field; callers branch on the status, not on this.
    pub fn category_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Access => "invalid request",
            ErrorKind::Param => "parameter validation failed",
            ErrorKind::Token => "token validation failed",
            ErrorKind::Cache | ErrorKind::Unknown => "translation failed",
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub details: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.category_message(),
            details: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
