//! Full-text lookup of nominations for the messaging extension.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::nomination::NominateEntity;
use crate::storage::StorageError;

pub mod azure;
pub mod table_scan;

pub use azure::{AzureSearchService, SearchConfig};
pub use table_scan::TableScanSearch;

/// Page size of a messaging-extension query.
pub const DEFAULT_RESULT_COUNT: usize = 10;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid search endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[async_trait]
pub trait NominationSearch: Send + Sync {
    /// Nominations of a team's cycle matching `query`, newest first. An empty
    /// or missing query matches everything.
    async fn search_nominations(
        &self,
        query: Option<&str>,
        cycle_id: &str,
        team_id: &str,
        count: Option<usize>,
        skip: Option<usize>,
    ) -> Result<Vec<NominateEntity>, SearchError>;

    /// Makes a freshly stored nomination searchable.
    async fn index_nomination(&self, nomination: &NominateEntity) -> Result<(), SearchError>;
}

/// OData filter restricting results to one team's cycle.
pub fn scope_filter(team_id: &str, cycle_id: &str) -> String {
    format!(
        "TeamId eq '{}' and RewardCycleId eq '{}'",
        escape_literal(team_id),
        escape_literal(cycle_id)
    )
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_filter_escapes_quotes() {
        assert_eq!(
            scope_filter("19:abc@thread.skype", "o'brien"),
            "TeamId eq '19:abc@thread.skype' and RewardCycleId eq 'o''brien'"
        );
    }
}
