//! Remote store adapter for the `people` table
//!
//! Every durable mutation goes through [`PersonStore`]. Each call is a
//! single round trip: no retries, no batching, no transactions.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::model::{NewPerson, Person, VotePatch};
use crate::{Error, Result};

mod memory;
mod rest;
mod sqlite;

pub use memory::{MemoryStore, StoreOp};
pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Default table name
pub const PEOPLE_TABLE: &str = "people";

/// CRUD capability set used by the registry, vote engine and placement flow
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Backend identifier for logs ("rest", "sqlite", "memory")
    fn backend(&self) -> &'static str;

    /// Select all rows
    async fn list_all(&self) -> std::result::Result<Vec<Person>, StoreError>;

    /// Insert one row; vote counters take the store default of 0
    async fn insert(&self, person: &NewPerson) -> std::result::Result<(), StoreError>;

    /// Patch only the counters present in `patch` for the row with `id`
    async fn update_votes(&self, id: &str, patch: VotePatch)
        -> std::result::Result<(), StoreError>;
}

/// Build the store selected by configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn PersonStore>> {
    let store: Arc<dyn PersonStore> = match config.backend {
        StoreBackend::Rest => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| Error::Config("store.url is required for the rest backend".into()))?;
            let key = config.api_key.clone().unwrap_or_default();
            Arc::new(RestStore::new(url, &key, &config.table, config.timeout())?)
        }
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.database_path).await?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };

    tracing::info!(backend = store.backend(), table = %config.table, "Opened people store");
    Ok(store)
}
