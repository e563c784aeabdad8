//! libSQL / Turso source store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database};
use tracing::{debug, info, instrument};

use retriever_core::error::{Result, RetrieverError};
use retriever_core::traits::SourceStore;
use retriever_core::types::{ContractRecord, SourceCode};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS code (
        address       TEXT PRIMARY KEY,
        contract_name TEXT NOT NULL,
        source_code   TEXT NOT NULL,
        binary_hash   TEXT NOT NULL,
        created_at    INTEGER NOT NULL,
        updated_at    INTEGER NOT NULL
    )";

const UPSERT: &str = "
    INSERT INTO code (address, contract_name, source_code, binary_hash, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?5)
    ON CONFLICT (address) DO UPDATE SET
        contract_name = excluded.contract_name,
        source_code   = excluded.source_code,
        binary_hash   = excluded.binary_hash,
        updated_at    = excluded.updated_at";

const SELECT_ONE: &str = "
    SELECT address, contract_name, source_code, binary_hash, created_at, updated_at
    FROM code WHERE address = ?1";

/// Source store backed by libSQL.
///
/// Timestamps are stored as UNIX seconds.
pub struct LibsqlStore {
    // Keeps the database alive for as long as the connection is used.
    _db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// Connects to `dsn`.
    ///
    /// `libsql://`, `http(s)://` and `ws(s)://` URLs go to a remote server.
    /// Anything else is treated as a local path, which needs the `local`
    /// feature.
    pub async fn connect(dsn: &str, auth_token: Option<&str>) -> Result<Self> {
        const REMOTE_SCHEMES: [&str; 5] = ["libsql://", "http://", "https://", "ws://", "wss://"];

        if REMOTE_SCHEMES.iter().any(|scheme| dsn.starts_with(scheme)) {
            return Self::connect_remote(dsn, auth_token.unwrap_or_default()).await;
        }

        #[cfg(any(test, feature = "local"))]
        {
            Self::open_local(dsn).await
        }

        #[cfg(not(any(test, feature = "local")))]
        {
            Err(RetrieverError::ConfigError(format!(
                "'{dsn}' is not a remote libSQL URL and local databases are not enabled"
            )))
        }
    }

    /// Connects to a remote libSQL / Turso database.
    pub async fn connect_remote(url: &str, auth_token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(storage_error)?;
        let store = Self::from_database(db)?;
        store.migrate().await?;

        info!(url, "Connected to remote libSQL database");
        Ok(store)
    }

    /// Opens a local database file, or `:memory:`.
    #[cfg(any(test, feature = "local"))]
    pub async fn open_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(storage_error)?;
        let store = Self::from_database(db)?;
        store.migrate().await?;

        info!(path, "Opened local libSQL database");
        Ok(store)
    }

    fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(storage_error)?;
        Ok(Self { _db: db, conn })
    }

    async fn migrate(&self) -> Result<()> {
        self.conn
            .execute(CREATE_TABLE, ())
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[async_trait]
impl SourceStore for LibsqlStore {
    #[instrument(skip(self, source))]
    async fn upsert(&self, address: &str, source: &SourceCode, binary_hash: &str) -> Result<()> {
        let source_json = serde_json::to_string(source)?;
        let now = Utc::now().timestamp();

        self.conn
            .execute(
                UPSERT,
                params![
                    address,
                    source.contract_name.as_str(),
                    source_json,
                    binary_hash,
                    now
                ],
            )
            .await
            .map_err(storage_error)?;

        debug!(address, "Upserted row");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, address: &str) -> Result<Option<ContractRecord>> {
        let mut rows = self
            .conn
            .query(SELECT_ONE, params![address])
            .await
            .map_err(storage_error)?;

        let Some(row) = rows.next().await.map_err(storage_error)? else {
            return Ok(None);
        };

        let source_json: String = row.get(2).map_err(storage_error)?;
        let record = ContractRecord {
            address: row.get(0).map_err(storage_error)?,
            contract_name: row.get(1).map_err(storage_error)?,
            source_code: serde_json::from_str(&source_json)?,
            binary_hash: row.get(3).map_err(storage_error)?,
            created_at: timestamp(row.get(4).map_err(storage_error)?)?,
            updated_at: timestamp(row.get(5).map_err(storage_error)?)?,
        };

        Ok(Some(record))
    }
}

fn storage_error(e: libsql::Error) -> RetrieverError {
    RetrieverError::StorageError(e.to_string())
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| RetrieverError::StorageError(format!("timestamp out of range: {secs}")))
}
