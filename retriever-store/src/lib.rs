//! # Retriever Store
//!
//! Persistence for verified source records, one row per contract address.
//!
//! Backends:
//!
//! - **Memory**: `DashMap`-backed, for development and tests
//! - **libSQL**: Turso / libSQL over the network, or a local file and
//!   `:memory:` with the `local` feature
//!
//! ## Example
//!
//! ```rust,ignore
//! use retriever_store::{LibsqlStore, SourceStore};
//!
//! let store = LibsqlStore::connect("libsql://code-retriever.turso.io", Some(token)).await?;
//! store.upsert(address, &source, &binary_hash).await?;
//! let row = store.get(address).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
mod turso;

pub use memory::MemoryStore;
pub use turso::LibsqlStore;

// Re-export the trait from core
pub use retriever_core::traits::SourceStore;
