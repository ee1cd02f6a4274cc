//! Managed search index over the nomination table.
//!
//! The index, and when the nominations live in cloud table storage also the
//! data source and scheduled indexer that keep it fed, are provisioned
//! lazily on first use. Without a table-storage data source, nominations are
//! pushed into the index as they are stored.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use super::{scope_filter, NominationSearch, SearchError, DEFAULT_RESULT_COUNT};
use crate::models::nomination::NominateEntity;
use crate::storage::TableEntity;

const API_VERSION: &str = "2020-06-30";
pub const INDEX_NAME: &str = "nominatedetaildata-index";
pub const INDEXER_NAME: &str = "nominatedetaildata-indexer";
pub const DATA_SOURCE_NAME: &str = "nominatedetaildata-storage";

const SELECT_FIELDS: &str = "NominationId,TeamId,AwardName,AwardId,AwardImageLink,NominatedOn,\
NominatedToName,NominatedToPrincipalName,NominatedToObjectId,NominatedByName,\
NominatedByPrincipalName,NominatedByObjectId,ReasonForNomination,RewardCycleId,\
IsGroupNomination,GroupName";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub service_name: String,
    pub admin_api_key: String,
    pub query_api_key: String,
    pub indexing_interval_minutes: u32,
    /// Table-storage connection string the indexer pulls from, when the
    /// nominations live there.
    pub storage_connection_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    value: Vec<NominateEntity>,
}

pub struct AzureSearchService {
    client: Client,
    config: SearchConfig,
    endpoint: Url,
    provisioned: OnceCell<()>,
}

impl AzureSearchService {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&format!(
            "https://{}.search.windows.net/",
            config.service_name
        ))?;
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            config,
            endpoint,
            provisioned: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, SearchError> {
        let mut url = self.endpoint.join(path)?;
        url.set_query(Some(&format!("api-version={API_VERSION}")));
        Ok(url)
    }

    async fn ensure_provisioned(&self) -> Result<(), SearchError> {
        self.provisioned
            .get_or_try_init(|| async {
                self.create_if_missing("indexes", INDEX_NAME, index_definition())
                    .await?;
                if let Some(connection_string) = &self.config.storage_connection_string {
                    self.create_if_missing(
                        "datasources",
                        DATA_SOURCE_NAME,
                        data_source_definition(connection_string),
                    )
                    .await?;
                    self.create_if_missing(
                        "indexers",
                        INDEXER_NAME,
                        indexer_definition(self.config.indexing_interval_minutes),
                    )
                    .await?;
                }
                Ok::<(), SearchError>(())
            })
            .await?;
        Ok(())
    }

    async fn create_if_missing(
        &self,
        collection: &str,
        name: &str,
        definition: Value,
    ) -> Result<(), SearchError> {
        let existing = self
            .client
            .get(self.url(&format!("{collection}/{name}"))?)
            .header("api-key", &self.config.admin_api_key)
            .send()
            .await?;
        if existing.status().is_success() {
            debug!("Search {collection}/{name} already exists");
            return Ok(());
        }
        if existing.status() != StatusCode::NOT_FOUND {
            return check(existing).await.map(|_| ());
        }

        let created = self
            .client
            .post(self.url(collection)?)
            .header("api-key", &self.config.admin_api_key)
            .json(&definition)
            .send()
            .await?;
        check(created).await?;
        info!("Created search {collection}/{name}");
        Ok(())
    }
}

#[async_trait]
impl NominationSearch for AzureSearchService {
    async fn search_nominations(
        &self,
        query: Option<&str>,
        cycle_id: &str,
        team_id: &str,
        count: Option<usize>,
        skip: Option<usize>,
    ) -> Result<Vec<NominateEntity>, SearchError> {
        self.ensure_provisioned().await?;

        let response = self
            .client
            .post(self.url(&format!("indexes/{INDEX_NAME}/docs/search"))?)
            .header("api-key", &self.config.query_api_key)
            .json(&search_request(query, cycle_id, team_id, count, skip))
            .send()
            .await?;
        let page: SearchPage = check(response).await?.json().await?;
        debug!("Search returned {} nominations", page.value.len());
        Ok(page.value)
    }

    async fn index_nomination(&self, nomination: &NominateEntity) -> Result<(), SearchError> {
        if self.config.storage_connection_string.is_some() {
            // The scheduled indexer picks it up from the table.
            return Ok(());
        }
        self.ensure_provisioned().await?;

        let response = self
            .client
            .post(self.url(&format!("indexes/{INDEX_NAME}/docs/index"))?)
            .header("api-key", &self.config.admin_api_key)
            .json(&index_batch(nomination)?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

fn search_request(
    query: Option<&str>,
    cycle_id: &str,
    team_id: &str,
    count: Option<usize>,
    skip: Option<usize>,
) -> Value {
    let text = query.map(str::trim).filter(|q| !q.is_empty()).unwrap_or("*");
    json!({
        "search": text,
        "filter": scope_filter(team_id, cycle_id),
        "orderby": "Timestamp desc",
        "top": count.unwrap_or(DEFAULT_RESULT_COUNT),
        "skip": skip.unwrap_or(0),
        "count": false,
        "select": SELECT_FIELDS,
    })
}

fn index_batch(nomination: &NominateEntity) -> Result<Value, SearchError> {
    let mut document = serde_json::to_value(nomination)?;
    if let Value::Object(fields) = &mut document {
        fields.insert("@search.action".to_string(), json!("mergeOrUpload"));
    }
    Ok(json!({ "value": [document] }))
}

fn index_definition() -> Value {
    fn field(name: &str, kind: &str, searchable: bool, filterable: bool, sortable: bool) -> Value {
        json!({
            "name": name,
            "type": kind,
            "searchable": searchable,
            "filterable": filterable,
            "sortable": sortable,
        })
    }

    let mut key = field("NominationId", "Edm.String", false, true, false);
    key["key"] = json!(true);

    json!({
        "name": INDEX_NAME,
        "fields": [
            key,
            field("TeamId", "Edm.String", false, true, false),
            field("AwardName", "Edm.String", true, true, false),
            field("AwardId", "Edm.String", false, false, false),
            field("AwardImageLink", "Edm.String", false, false, false),
            field("NominatedOn", "Edm.DateTimeOffset", false, false, true),
            field("NominatedToName", "Edm.String", true, true, false),
            field("NominatedToPrincipalName", "Edm.String", true, true, false),
            field("NominatedToObjectId", "Edm.String", false, false, false),
            field("NominatedByName", "Edm.String", true, false, false),
            field("NominatedByPrincipalName", "Edm.String", true, true, false),
            field("NominatedByObjectId", "Edm.String", false, false, false),
            field("ReasonForNomination", "Edm.String", false, false, false),
            field("RewardCycleId", "Edm.String", false, true, false),
            field("IsGroupNomination", "Edm.String", false, false, false),
            field("GroupName", "Edm.String", false, false, false),
            field("AwardGranted", "Edm.Boolean", false, true, false),
            field("AwardPublishedOn", "Edm.DateTimeOffset", false, false, false),
            field("Timestamp", "Edm.DateTimeOffset", false, true, true),
        ],
    })
}

fn data_source_definition(connection_string: &str) -> Value {
    json!({
        "name": DATA_SOURCE_NAME,
        "type": "azuretable",
        "credentials": { "connectionString": connection_string },
        "container": { "name": NominateEntity::TABLE },
    })
}

fn indexer_definition(interval_minutes: u32) -> Value {
    json!({
        "name": INDEXER_NAME,
        "dataSourceName": DATA_SOURCE_NAME,
        "targetIndexName": INDEX_NAME,
        "schedule": { "interval": format!("PT{}M", interval_minutes.max(5)) },
    })
}

async fn check(response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!("Search service returned {status}: {message}");
    Err(SearchError::Service {
        status: status.as_u16(),
        message,
    })
}
