use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{EntityKey, StorageError, StoredRecord, TableStore};

/// Process-local table store. Used for local runs (`STORAGE_BACKEND=memory`)
/// and by the test suite.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: RwLock<BTreeMap<String, BTreeMap<EntityKey, (Value, DateTime<Utc>)>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn get(&self, table: &str, key: &EntityKey) -> Result<Option<StoredRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.get(key))
            .map(|(data, timestamp)| StoredRecord {
                key: key.clone(),
                data: data.clone(),
                timestamp: *timestamp,
            }))
    }

    async fn query_partition(
        &self,
        table: &str,
        partition: &str,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|(key, _)| key.partition == partition)
                    .map(|(key, (data, timestamp))| StoredRecord {
                        key: key.clone(),
                        data: data.clone(),
                        timestamp: *timestamp,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_table(&self, table: &str) -> Result<Vec<StoredRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .map(|(key, (data, timestamp))| StoredRecord {
                        key: key.clone(),
                        data: data.clone(),
                        timestamp: *timestamp,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(
        &self,
        table: &str,
        key: &EntityKey,
        data: &Value,
    ) -> Result<DateTime<Utc>, StorageError> {
        let timestamp = Utc::now();
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .insert(key.clone(), (data.clone(), timestamp));
        Ok(timestamp)
    }

    async fn delete(&self, table: &str, key: &EntityKey) -> Result<bool, StorageError> {
        Ok(self
            .tables
            .write()
            .await
            .get_mut(table)
            .and_then(|rows| rows.remove(key))
            .is_some())
    }
}
