//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use retriever_core::error::RetrieverError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// Failure talking to the source API or the node.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "UPSTREAM_ERROR")
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<RetrieverError> for ApiError {
    fn from(err: RetrieverError) -> Self {
        match &err {
            RetrieverError::NotAContract(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "Address is not a contract", "NOT_A_CONTRACT")
            }
            _ if err.is_validation_error() => ApiError::bad_request(err.to_string()),
            RetrieverError::Upstream(_)
            | RetrieverError::NoResult
            | RetrieverError::UnknownResponse(_)
            | RetrieverError::ProxyDepthExceeded { .. }
            | RetrieverError::HttpError(_)
            | RetrieverError::RpcError(_) => {
                tracing::warn!(error = %err, "Upstream error");
                ApiError::upstream(err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(RetrieverError::InvalidAddress("0x1".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RetrieverError::NotAContract("0x1".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RetrieverError::NoResult).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(RetrieverError::StorageError("locked".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_message_is_kept() {
        let err = ApiError::from(RetrieverError::Upstream("Max rate limit reached".into()));
        assert_eq!(err.message, "Max rate limit reached");
        assert_eq!(err.code, "UPSTREAM_ERROR");
    }
}
