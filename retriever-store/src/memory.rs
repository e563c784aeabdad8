//! In-memory source store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, instrument};

use retriever_core::error::Result;
use retriever_core::traits::SourceStore;
use retriever_core::types::{ContractRecord, SourceCode};

/// In-memory source store.
///
/// Same upsert semantics as the SQL backend; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<String, ContractRecord>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a complete row as-is, timestamps included.
    ///
    /// Useful for seeding old or fresh rows.
    pub fn insert_record(&self, record: ContractRecord) {
        self.rows.insert(record.address.clone(), record);
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    #[instrument(skip(self, source))]
    async fn upsert(&self, address: &str, source: &SourceCode, binary_hash: &str) -> Result<()> {
        let now = Utc::now();

        self.rows
            .entry(address.to_string())
            .and_modify(|row| {
                row.contract_name = source.contract_name.clone();
                row.source_code = source.clone();
                row.binary_hash = binary_hash.to_string();
                row.updated_at = now;
            })
            .or_insert_with(|| ContractRecord {
                address: address.to_string(),
                contract_name: source.contract_name.clone(),
                source_code: source.clone(),
                binary_hash: binary_hash.to_string(),
                created_at: now,
                updated_at: now,
            });

        debug!(address, "Upserted row");
        Ok(())
    }

    async fn get(&self, address: &str) -> Result<Option<ContractRecord>> {
        Ok(self.rows.get(address).map(|row| row.value().clone()))
    }
}
