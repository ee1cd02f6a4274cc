//! Keyed table storage.
//!
//! Every entity lives in a named table under an explicit composite key
//! (`partition`, `row`). Backends only ever see that key and an opaque JSON
//! document, so the business types never overload a backend's native key
//! columns. `Table<E>` is the typed view the feature modules work with.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::admins::AdminStore;
use crate::awards::AwardStore;
use crate::endorsements::EndorsementStore;
use crate::nominations::NominationStore;
use crate::reward_cycles::RewardCycleStore;
use crate::teams::TeamStore;

pub mod azure_table;
pub mod memory;
pub mod postgres;

/// Name of the timestamp property the store assigns on every write.
pub const TIMESTAMP_FIELD: &str = "Timestamp";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub partition: String,
    pub row: String,
}

impl EntityKey {
    pub fn new(partition: impl Into<String>, row: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            row: row.into(),
        }
    }
}

/// A document as returned by a backend.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub key: EntityKey,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Table service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage connection string: {0}")]
    ConnectionString(String),
}

/// Minimal keyed table store. Writes are insert-or-replace; there are no
/// cross-entity transactions.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn get(&self, table: &str, key: &EntityKey) -> Result<Option<StoredRecord>, StorageError>;

    async fn query_partition(
        &self,
        table: &str,
        partition: &str,
    ) -> Result<Vec<StoredRecord>, StorageError>;

    async fn query_table(&self, table: &str) -> Result<Vec<StoredRecord>, StorageError>;

    /// Inserts or replaces the document and returns the timestamp the store
    /// assigned to it.
    async fn upsert(
        &self,
        table: &str,
        key: &EntityKey,
        data: &Value,
    ) -> Result<DateTime<Utc>, StorageError>;

    /// Returns `false` when nothing was stored under `key`.
    async fn delete(&self, table: &str, key: &EntityKey) -> Result<bool, StorageError>;
}

/// A record type that can be persisted through `Table<E>`.
pub trait TableEntity: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: &'static str;

    fn key(&self) -> EntityKey;

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>);
}

/// Typed repository over a shared `TableStore`.
pub struct Table<E> {
    store: Arc<dyn TableStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: TableEntity> Table<E> {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn get(&self, key: &EntityKey) -> Result<Option<E>, StorageError> {
        match self.store.get(E::TABLE, key).await? {
            Some(record) => Ok(Some(decode(record)?)),
            None => Ok(None),
        }
    }

    pub async fn list_partition(&self, partition: &str) -> Result<Vec<E>, StorageError> {
        self.store
            .query_partition(E::TABLE, partition)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn list_all(&self) -> Result<Vec<E>, StorageError> {
        self.store
            .query_table(E::TABLE)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Persists `entity` and hands it back with the store-assigned timestamp.
    pub async fn upsert(&self, mut entity: E) -> Result<E, StorageError> {
        let key = entity.key();
        let mut data = serde_json::to_value(&entity)?;
        if let Value::Object(map) = &mut data {
            map.remove(TIMESTAMP_FIELD);
        }
        let timestamp = self.store.upsert(E::TABLE, &key, &data).await?;
        entity.set_timestamp(timestamp);
        Ok(entity)
    }

    pub async fn delete(&self, key: &EntityKey) -> Result<bool, StorageError> {
        self.store.delete(E::TABLE, key).await
    }
}

/// One repository per entity type, all over the same backend.
#[derive(Clone)]
pub struct Repositories {
    pub teams: TeamStore,
    pub awards: AwardStore,
    pub nominations: NominationStore,
    pub endorsements: EndorsementStore,
    pub reward_cycles: RewardCycleStore,
    pub admins: AdminStore,
}

impl Repositories {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            teams: TeamStore::new(store.clone()),
            awards: AwardStore::new(store.clone()),
            nominations: NominationStore::new(store.clone()),
            endorsements: EndorsementStore::new(store.clone()),
            reward_cycles: RewardCycleStore::new(store.clone()),
            admins: AdminStore::new(store),
        }
    }

    /// Repositories over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryTableStore::new()))
    }
}

fn decode<E: TableEntity>(record: StoredRecord) -> Result<E, StorageError> {
    let mut entity: E = serde_json::from_value(record.data)?;
    entity.set_timestamp(record.timestamp);
    Ok(entity)
}
