//! # Retriever Resolver
//!
//! Upstream clients and the read-through resolver for contract source code.
//!
//! - [`EtherscanClient`]: rate-limited `getsourcecode` client
//! - [`RpcClient`]: `eth_getCode` contract check and code hash
//! - [`SourceResolver`]: cache → store → upstream, following proxies

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod etherscan;
mod resolver;
mod rpc;

pub use etherscan::{parse_source_response, EtherscanClient, EtherscanConfig};
pub use resolver::{ResolveResult, ResolverConfig, SourceOrigin, SourceResolver};
pub use rpc::{RpcClient, RpcConfig};
