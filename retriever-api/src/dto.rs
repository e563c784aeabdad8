//! Response bodies that are not domain types.

use serde::Serialize;

use retriever_cache::CacheStats;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Source cache occupancy
    pub cache: CacheStatsDto,
}

/// Source cache occupancy.
#[derive(Debug, Serialize)]
pub struct CacheStatsDto {
    /// Entries held, expired or not
    pub total_entries: usize,
    /// Entries that would still be returned
    pub valid_entries: usize,
    /// Entries waiting for the sweeper
    pub expired_entries: usize,
}

impl From<CacheStats> for CacheStatsDto {
    fn from(stats: CacheStats) -> Self {
        Self {
            total_entries: stats.total_entries,
            valid_entries: stats.valid_entries,
            expired_entries: stats.expired_entries,
        }
    }
}
