//! Table store over the cloud table-storage REST API.
//!
//! Authorisation is a shared access signature taken from a connection string
//! of the form `TableEndpoint=https://<account>.table.core.windows.net/;SharedAccessSignature=sv=...`.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::{form_urlencoded, Url};

use super::{EntityKey, StorageError, StoredRecord, TableStore, TIMESTAMP_FIELD};

const ACCEPT_NO_METADATA: &str = "application/json;odata=nometadata";
const STORAGE_VERSION: &str = "2019-02-02";
const NEXT_PARTITION_HEADER: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_HEADER: &str = "x-ms-continuation-NextRowKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConnection {
    pub endpoint: String,
    pub sas: String,
}

/// Parses the SAS form of a storage connection string.
pub fn parse_connection_string(raw: &str) -> Result<TableConnection, StorageError> {
    let mut endpoint = None;
    let mut sas = None;

    for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, value)) = part.split_once('=') else {
            return Err(StorageError::ConnectionString(format!(
                "malformed segment '{part}'"
            )));
        };
        match name {
            "TableEndpoint" => endpoint = Some(value.to_string()),
            "SharedAccessSignature" => sas = Some(value.trim_start_matches('?').to_string()),
            _ => {}
        }
    }

    let mut endpoint = endpoint
        .ok_or_else(|| StorageError::ConnectionString("TableEndpoint is missing".into()))?;
    let sas = sas.ok_or_else(|| {
        StorageError::ConnectionString("SharedAccessSignature is missing".into())
    })?;
    if !endpoint.ends_with('/') {
        endpoint.push('/');
    }

    Ok(TableConnection { endpoint, sas })
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    value: Vec<Value>,
}

pub struct AzureTableStore {
    client: Client,
    connection: TableConnection,
    known_tables: Mutex<HashSet<String>>,
}

impl AzureTableStore {
    pub fn new(connection: TableConnection) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            connection,
            known_tables: Mutex::new(HashSet::new()),
        }
    }

    fn url(&self, resource: &str, query: Option<&str>) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.connection.endpoint)
            .map_err(|e| StorageError::ConnectionString(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::ConnectionString("endpoint cannot be a base".into()))?
            .pop_if_empty()
            .push(resource);
        match query {
            Some(extra) => url.set_query(Some(&format!("{}&{}", self.connection.sas, extra))),
            None => url.set_query(Some(&self.connection.sas)),
        }
        Ok(url)
    }

    fn entity_url(&self, table: &str, key: &EntityKey) -> Result<Url, StorageError> {
        self.url(
            &format!(
                "{table}(PartitionKey='{}',RowKey='{}')",
                escape_key(&key.partition),
                escape_key(&key.row)
            ),
            None,
        )
    }

    /// Creates `table` the first time this process touches it.
    async fn ensure_table(&self, table: &str) -> Result<(), StorageError> {
        let mut known = self.known_tables.lock().await;
        if known.contains(table) {
            return Ok(());
        }

        let response = self
            .client
            .post(self.url("Tables", None)?)
            .header("Accept", ACCEPT_NO_METADATA)
            .header("x-ms-version", STORAGE_VERSION)
            .json(&json!({ "TableName": table }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CONFLICT {
            check(response).await?;
            info!("Created storage table {table}");
        }
        known.insert(table.to_string());
        Ok(())
    }

    async fn query(&self, table: &str, filter: Option<String>) -> Result<Vec<StoredRecord>, StorageError> {
        self.ensure_table(table).await?;

        let mut records = Vec::new();
        let mut continuation: Option<(String, Option<String>)> = None;

        loop {
            let mut params = Vec::new();
            if let Some(filter) = &filter {
                params.push(format!("$filter={}", encode_component(filter)));
            }
            if let Some((next_partition, next_row)) = &continuation {
                params.push(format!("NextPartitionKey={}", encode_component(next_partition)));
                if let Some(next_row) = next_row {
                    params.push(format!("NextRowKey={}", encode_component(next_row)));
                }
            }
            let query = params.join("&");
            let url = self.url(
                &format!("{table}()"),
                (!query.is_empty()).then_some(query.as_str()),
            )?;

            let response = self
                .client
                .get(url)
                .header("Accept", ACCEPT_NO_METADATA)
                .header("x-ms-version", STORAGE_VERSION)
                .send()
                .await?;
            let response = check(response).await?;

            let next_partition = header_value(&response, NEXT_PARTITION_HEADER);
            let next_row = header_value(&response, NEXT_ROW_HEADER);

            let page: QueryPage = response.json().await?;
            for value in page.value {
                records.push(into_record(value)?);
            }

            match next_partition {
                Some(partition) => {
                    debug!("Following continuation token for table {table}");
                    continuation = Some((partition, next_row));
                }
                None => break,
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl TableStore for AzureTableStore {
    async fn get(&self, table: &str, key: &EntityKey) -> Result<Option<StoredRecord>, StorageError> {
        self.ensure_table(table).await?;

        let response = self
            .client
            .get(self.entity_url(table, key)?)
            .header("Accept", ACCEPT_NO_METADATA)
            .header("x-ms-version", STORAGE_VERSION)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value: Value = check(response).await?.json().await?;
        Ok(Some(into_record(value)?))
    }

    async fn query_partition(
        &self,
        table: &str,
        partition: &str,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        self.query(
            table,
            Some(format!("PartitionKey eq '{}'", escape_key(partition))),
        )
        .await
    }

    async fn query_table(&self, table: &str) -> Result<Vec<StoredRecord>, StorageError> {
        self.query(table, None).await
    }

    async fn upsert(
        &self,
        table: &str,
        key: &EntityKey,
        data: &Value,
    ) -> Result<DateTime<Utc>, StorageError> {
        self.ensure_table(table).await?;

        let body = entity_body(key, data);
        let response = self
            .client
            .put(self.entity_url(table, key)?)
            .header("Accept", ACCEPT_NO_METADATA)
            .header("x-ms-version", STORAGE_VERSION)
            .json(&body)
            .send()
            .await?;
        let response = check(response).await?;

        Ok(header_value(&response, "Date")
            .and_then(|date| DateTime::parse_from_rfc2822(&date).ok())
            .map(|date| date.with_timezone(&Utc))
            .unwrap_or_else(Utc::now))
    }

    async fn delete(&self, table: &str, key: &EntityKey) -> Result<bool, StorageError> {
        self.ensure_table(table).await?;

        let response = self
            .client
            .delete(self.entity_url(table, key)?)
            .header("Accept", ACCEPT_NO_METADATA)
            .header("x-ms-version", STORAGE_VERSION)
            .header("If-Match", "*")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        Ok(true)
    }
}

async fn check(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StorageError::Service {
        status: status.as_u16(),
        message,
    })
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Single quotes are doubled inside OData key literals.
fn escape_key(value: &str) -> String {
    value.replace('\'', "''")
}

/// Percent-encodes a query component; spaces become `%20`, not `+`.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Flattens the document into table-service properties. Null properties are
/// dropped; the service has no null type.
fn entity_body(key: &EntityKey, data: &Value) -> Value {
    let mut body = Map::new();
    if let Value::Object(fields) = data {
        for (name, value) in fields {
            if !value.is_null() {
                body.insert(name.clone(), value.clone());
            }
        }
    }
    body.insert("PartitionKey".into(), Value::String(key.partition.clone()));
    body.insert("RowKey".into(), Value::String(key.row.clone()));
    Value::Object(body)
}

fn into_record(value: Value) -> Result<StoredRecord, StorageError> {
    let Value::Object(mut fields) = value else {
        return Err(StorageError::Service {
            status: 200,
            message: "entity payload is not an object".into(),
        });
    };

    let partition = take_string(&mut fields, "PartitionKey");
    let row = take_string(&mut fields, "RowKey");
    let timestamp = fields
        .remove(TIMESTAMP_FIELD)
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    fields.retain(|name, _| !name.starts_with("odata."));

    Ok(StoredRecord {
        key: EntityKey::new(partition, row),
        data: Value::Object(fields),
        timestamp,
    })
}

fn take_string(fields: &mut Map<String, Value>, name: &str) -> String {
    fields
        .remove(name)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
