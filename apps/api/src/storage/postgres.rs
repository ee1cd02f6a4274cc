use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use super::{EntityKey, StorageError, StoredRecord, TableStore};

/// Table store over a single Postgres relation (see `db::ensure_schema`).
#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
}

impl PgTableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EntityRow {
    partition_key: String,
    row_key: String,
    data: Value,
    updated_at: DateTime<Utc>,
}

impl From<EntityRow> for StoredRecord {
    fn from(row: EntityRow) -> Self {
        StoredRecord {
            key: EntityKey::new(row.partition_key, row.row_key),
            data: row.data,
            timestamp: row.updated_at,
        }
    }
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn get(&self, table: &str, key: &EntityKey) -> Result<Option<StoredRecord>, StorageError> {
        let row: Option<EntityRow> = sqlx::query_as(
            r#"
            SELECT partition_key, row_key, data, updated_at
            FROM table_entities
            WHERE table_name = $1 AND partition_key = $2 AND row_key = $3
            "#,
        )
        .bind(table)
        .bind(&key.partition)
        .bind(&key.row)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredRecord::from))
    }

    async fn query_partition(
        &self,
        table: &str,
        partition: &str,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let rows: Vec<EntityRow> = sqlx::query_as(
            r#"
            SELECT partition_key, row_key, data, updated_at
            FROM table_entities
            WHERE table_name = $1 AND partition_key = $2
            ORDER BY row_key
            "#,
        )
        .bind(table)
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn query_table(&self, table: &str) -> Result<Vec<StoredRecord>, StorageError> {
        let rows: Vec<EntityRow> = sqlx::query_as(
            r#"
            SELECT partition_key, row_key, data, updated_at
            FROM table_entities
            WHERE table_name = $1
            ORDER BY partition_key, row_key
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn upsert(
        &self,
        table: &str,
        key: &EntityKey,
        data: &Value,
    ) -> Result<DateTime<Utc>, StorageError> {
        let updated_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO table_entities (table_name, partition_key, row_key, data, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (table_name, partition_key, row_key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            RETURNING updated_at
            "#,
        )
        .bind(table)
        .bind(&key.partition)
        .bind(&key.row)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated_at)
    }

    async fn delete(&self, table: &str, key: &EntityKey) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "DELETE FROM table_entities WHERE table_name = $1 AND partition_key = $2 AND row_key = $3",
        )
        .bind(table)
        .bind(&key.partition)
        .bind(&key.row)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
