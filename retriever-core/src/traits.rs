//! Common traits for the retriever.
//!
//! These are the seams between the resolver and its collaborators, so the
//! read-through logic can be tested without a network or a database.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ContractRecord, SourceCode};

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE API TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the upstream verified-source API.
#[async_trait]
pub trait SourceCodeApi: Send + Sync {
    /// Fetches the verified source record for a contract address.
    ///
    /// Implementations are responsible for honoring the upstream rate limit.
    async fn fetch_source(&self, address: &str) -> Result<SourceCode>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTRACT INSPECTOR TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for on-chain code lookups.
#[async_trait]
pub trait ContractInspector: Send + Sync {
    /// Returns true if code is deployed at the address.
    async fn is_contract(&self, address: &str) -> Result<bool>;

    /// Returns `0x` + hex SHA-256 of the deployed code.
    ///
    /// Fails with `NotAContract` if the address has no code.
    async fn code_hash(&self, address: &str) -> Result<String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for persisted source records.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - libSQL / Turso (for production)
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Inserts or refreshes the row for `address`.
    ///
    /// On conflict the name, source and hash are replaced and `updated_at`
    /// is bumped; `created_at` is preserved.
    async fn upsert(&self, address: &str, source: &SourceCode, binary_hash: &str) -> Result<()>;

    /// Returns the row for `address`, if any.
    async fn get(&self, address: &str) -> Result<Option<ContractRecord>>;
}
