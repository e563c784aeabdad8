//! # Retriever Core
//!
//! Core types, errors, and traits for the contract source-code retriever.
//!
//! This crate provides the foundational building blocks used by all other retriever crates:
//!
//! - **Types**: The Etherscan source record, the persisted contract row, addresses
//! - **Errors**: One error enum shared by every collaborator
//! - **Constants**: TTLs, rate limits, upstream defaults
//! - **Traits**: Seams for the source API, the RPC node and the store
//!
//! ## Example
//!
//! ```rust
//! use retriever_core::SourceCode;
//!
//! let source = SourceCode {
//!     contract_name: "Token".into(),
//!     ..Default::default()
//! };
//! let json = serde_json::to_string(&source).unwrap();
//! assert!(json.contains("\"contractName\":\"Token\""));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, RetrieverError};
pub use traits::*;
pub use types::*;
