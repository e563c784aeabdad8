//! TTL cache for the retriever.
//!
//! Generic in-memory cache with per-entry expiry, a periodically refreshed
//! logical clock, and a background sweeper. Both background loops stop on
//! [`TtlCache::shutdown`] or when the cache is dropped.

mod cache;
mod clock;

pub use cache::{CacheConfig, CacheStats, TtlCache, DEFAULT_CLOCK_TICK};
pub use clock::{Clock, ManualClock, SystemClock};
