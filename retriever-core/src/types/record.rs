//! Persisted contract rows.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceCode;

/// A stored source record for one contract address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Contract address, `0x` + 40 hex chars
    pub address: String,
    /// Copy of `source_code.contract_name` for querying
    pub contract_name: String,
    /// The full source record
    pub source_code: SourceCode,
    /// `0x` + hex SHA-256 of the deployed bytecode string
    pub binary_hash: String,
    /// First time this address was stored
    pub created_at: DateTime<Utc>,
    /// Last time the row was refreshed from upstream
    pub updated_at: DateTime<Utc>,
}

impl ContractRecord {
    /// Time elapsed since the row was last refreshed, as seen at `now`.
    ///
    /// Rows stamped in the future count as zero age.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Returns true if the row is younger than `max_age` at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age_at(now) < max_age
    }

    /// How much longer the row stays fresh, if at all.
    pub fn remaining_freshness_at(&self, now: DateTime<Utc>, max_age: Duration) -> Option<Duration> {
        max_age.checked_sub(self.age_at(now)).filter(|d| !d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn record_updated(updated_at: DateTime<Utc>) -> ContractRecord {
        ContractRecord {
            address: "0x00000000000000000000000000000000000000aa".into(),
            contract_name: "A".into(),
            source_code: SourceCode::default(),
            binary_hash: format!("0x{}", "00".repeat(32)),
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn test_freshness() {
        let now = Utc::now();
        let thirty_days = Duration::from_secs(30 * 24 * 3600);

        let fresh = record_updated(now - ChronoDuration::days(29));
        assert!(fresh.is_fresh_at(now, thirty_days));
        let remaining = fresh.remaining_freshness_at(now, thirty_days).unwrap();
        assert_eq!(remaining.as_secs(), 24 * 3600);

        let stale = record_updated(now - ChronoDuration::days(31));
        assert!(!stale.is_fresh_at(now, thirty_days));
        assert!(stale.remaining_freshness_at(now, thirty_days).is_none());
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let now = Utc::now();
        let record = record_updated(now + ChronoDuration::hours(1));
        assert_eq!(record.age_at(now), Duration::ZERO);
    }
}
