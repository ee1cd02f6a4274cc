use async_trait::async_trait;

use super::{NominationSearch, SearchError, DEFAULT_RESULT_COUNT};
use crate::models::nomination::NominateEntity;
use crate::nominations::NominationStore;

/// Substring search straight over the nomination table. Used when no managed
/// search service is configured.
#[derive(Clone)]
pub struct TableScanSearch {
    nominations: NominationStore,
}

impl TableScanSearch {
    pub fn new(nominations: NominationStore) -> Self {
        Self { nominations }
    }
}

fn matches(nomination: &NominateEntity, needle: &str) -> bool {
    [
        nomination.award_name.as_str(),
        nomination.nominated_to_name.as_str(),
        nomination.nominated_to_principal_name.as_str(),
        nomination.nominated_by_name.as_str(),
        nomination.nominated_by_principal_name.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

#[async_trait]
impl NominationSearch for TableScanSearch {
    async fn search_nominations(
        &self,
        query: Option<&str>,
        cycle_id: &str,
        team_id: &str,
        count: Option<usize>,
        skip: Option<usize>,
    ) -> Result<Vec<NominateEntity>, SearchError> {
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty() && *q != "*")
            .map(str::to_lowercase);

        let mut hits: Vec<NominateEntity> = self
            .nominations
            .list_cycle(team_id, cycle_id)
            .await?
            .into_iter()
            .filter(|n| needle.as_deref().map_or(true, |needle| matches(n, needle)))
            .collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(hits
            .into_iter()
            .skip(skip.unwrap_or(0))
            .take(count.unwrap_or(DEFAULT_RESULT_COUNT))
            .collect())
    }

    async fn index_nomination(&self, _nomination: &NominateEntity) -> Result<(), SearchError> {
        Ok(())
    }
}
