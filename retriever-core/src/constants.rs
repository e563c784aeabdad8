//! Constants shared across the retriever crates.
//!
//! The reference deployment sizes everything around Etherscan's free tier:
//! five requests per second for all traffic combined.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// How long a fetched source record stays in the in-memory cache.
pub const SOURCE_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How often the cache sweeps out expired entries.
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Stored rows older than this are re-fetched from upstream.
pub const STORE_FRESHNESS: Duration = Duration::from_secs(30 * 24 * 60 * 60);

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Default Etherscan API endpoint.
pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";

/// Sustained request rate allowed against the source API.
pub const ETHERSCAN_REQUESTS_PER_SECOND: u32 = 5;

/// Burst size for the source API limiter.
pub const ETHERSCAN_BURST: u32 = 5;

/// Default HTTP timeout for upstream calls, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of proxy hops followed while resolving an implementation.
pub const MAX_PROXY_DEPTH: usize = 4;

/// Etherscan marks proxy contracts with this value in the `Proxy` field.
pub const PROXY_FLAG: &str = "1";

/// `eth_getCode` result for an address with no deployed code.
pub const EMPTY_CODE: &str = "0x";

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESSES & HTTP
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of a `0x`-prefixed Ethereum address string.
pub const ADDRESS_LENGTH: usize = 42;

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 8080;
