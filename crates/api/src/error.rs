//! API error types with HTTP and RPC response mapping.
//!
//! Both transports share one classification so that a failure carries the
//! same message whichever way the operation was called. Internal detail such
//! as store or driver messages is logged here and never put in a response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, DomainError};
use serde::Serialize;

/// Failure classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    CartNotFound,
    CartItemNotFound,
    DuplicateCartItem,
    DuplicateCart,
    ConcurrentModification,
    CartNotSaved,
    OrderServiceUnavailable,
    Internal,
}

impl ErrorKind {
    /// Stable, caller-facing message.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "Invalid request data",
            ErrorKind::CartNotFound => "The cart does not exist",
            ErrorKind::CartItemNotFound => "The cart item does not exist",
            ErrorKind::DuplicateCartItem => "Cannot put same product twice",
            ErrorKind::DuplicateCart => "Single user should only have a single cart",
            ErrorKind::ConcurrentModification => {
                "The cart was modified concurrently, retry the request"
            }
            ErrorKind::CartNotSaved => "Cart saving failed",
            ErrorKind::OrderServiceUnavailable => "Order placements are not available",
            ErrorKind::Internal => "Service is not available",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::CartNotFound | ErrorKind::CartItemNotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateCartItem
            | ErrorKind::DuplicateCart
            | ErrorKind::ConcurrentModification => StatusCode::CONFLICT,
            ErrorKind::CartNotSaved
            | ErrorKind::OrderServiceUnavailable
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn rpc_code(self) -> RpcCode {
        match self {
            ErrorKind::InvalidRequest => RpcCode::InvalidArgument,
            ErrorKind::CartNotFound | ErrorKind::CartItemNotFound => RpcCode::NotFound,
            ErrorKind::DuplicateCartItem | ErrorKind::DuplicateCart => RpcCode::ResourceExhausted,
            ErrorKind::ConcurrentModification => RpcCode::Aborted,
            ErrorKind::CartNotSaved
            | ErrorKind::OrderServiceUnavailable
            | ErrorKind::Internal => RpcCode::Internal,
        }
    }
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed body, query or path, or a field failing validation.
    InvalidRequest(String),
    /// Cart operation error.
    Domain(DomainError),
    /// Checkout error.
    Checkout(CheckoutError),
}

impl ApiError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ApiError::InvalidRequest(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ApiError::Domain(err) => domain_error_kind(err),
            ApiError::Checkout(err) => match err {
                CheckoutError::OrderServiceUnavailable(_) => ErrorKind::OrderServiceUnavailable,
                CheckoutError::CartNotSaved { .. } => ErrorKind::CartNotSaved,
                CheckoutError::Domain(err) => domain_error_kind(err),
            },
        }
    }

    fn log(&self, kind: ErrorKind) {
        match kind.status() {
            s if s.is_server_error() => tracing::error!(error = ?self, "request failed"),
            _ => tracing::debug!(error = ?self, "request rejected"),
        }
    }
}

fn domain_error_kind(err: &DomainError) -> ErrorKind {
    match err {
        DomainError::CartNotFound { .. } => ErrorKind::CartNotFound,
        DomainError::CartAlreadyExists { .. } => ErrorKind::DuplicateCart,
        DomainError::Cart(CartError::CartItemNotFound { .. }) => ErrorKind::CartItemNotFound,
        DomainError::Cart(CartError::DuplicateCartItem { .. }) => ErrorKind::DuplicateCartItem,
        DomainError::ConcurrencyConflict { .. } => ErrorKind::ConcurrentModification,
        DomainError::CartNotSaved(_) => ErrorKind::CartNotSaved,
        DomainError::Store(_) => ErrorKind::Internal,
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        self.log(kind);
        (
            kind.status(),
            Json(ErrorBody {
                error: kind.message(),
            }),
        )
            .into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

/// gRPC status codes used by the RPC-style transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    ResourceExhausted,
    Aborted,
    Internal,
}

impl RpcCode {
    /// HTTP status carrying this code, following the usual gRPC/HTTP mapping.
    pub fn http_status(self) -> StatusCode {
        match self {
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            RpcCode::Aborted => StatusCode::CONFLICT,
            RpcCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error status returned by RPC handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: &'static str,
}

impl From<ApiError> for RpcStatus {
    fn from(err: ApiError) -> Self {
        let kind = err.kind();
        err.log(kind);
        RpcStatus {
            code: kind.rpc_code(),
            message: kind.message(),
        }
    }
}

impl From<DomainError> for RpcStatus {
    fn from(err: DomainError) -> Self {
        ApiError::from(err).into()
    }
}

impl IntoResponse for RpcStatus {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}
