//! Error types for the retriever.
//!
//! One `thiserror` enum covers every collaborator: the source API client,
//! the RPC client, the stores and the resolver. The cache has no errors.

use thiserror::Error;

/// Result type alias using `RetrieverError`.
pub type Result<T> = std::result::Result<T, RetrieverError>;

/// Main error type for all retriever operations.
#[derive(Debug, Error)]
pub enum RetrieverError {
    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Address is missing or malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No code is deployed at the address.
    #[error("Address is not a contract: {0}")]
    NotAContract(String),

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM SOURCE API ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The source API answered with an error message instead of a record.
    #[error("{0}")]
    Upstream(String),

    /// The source API answered with an empty result list.
    #[error("no result")]
    NoResult,

    /// The source API answered with something we cannot interpret.
    #[error("unknown result: {0}")]
    UnknownResponse(String),

    /// Proxy chain is longer than we are willing to follow.
    #[error("Proxy chain starting at '{address}' exceeds {max_depth} hops")]
    ProxyDepthExceeded {
        /// Address at which the limit was hit
        address: String,
        /// Hops allowed
        max_depth: usize,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// RPC call failed.
    #[error("RPC call failed: {0}")]
    RpcError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE & SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RetrieverError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RetrieverError::HttpError(_) | RetrieverError::RpcError(_)
        )
    }

    /// Returns true if this error was caused by the caller's input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RetrieverError::InvalidAddress(_)
                | RetrieverError::NotAContract(_)
                | RetrieverError::ValidationError(_)
        )
    }
}
