use std::sync::Arc;

use tracing::debug;

use crate::models::award::AwardEntity;
use crate::storage::{EntityKey, StorageError, Table, TableStore};

#[derive(Clone)]
pub struct AwardStore {
    table: Table<AwardEntity>,
}

impl AwardStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            table: Table::new(store),
        }
    }

    /// All awards of a team, most recently written first.
    pub async fn list(&self, team_id: &str) -> Result<Vec<AwardEntity>, StorageError> {
        let mut awards = self.table.list_partition(team_id).await?;
        awards.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(awards)
    }

    pub async fn get(
        &self,
        team_id: &str,
        award_id: &str,
    ) -> Result<Option<AwardEntity>, StorageError> {
        self.table.get(&EntityKey::new(team_id, award_id)).await
    }

    pub async fn upsert(&self, award: AwardEntity) -> Result<AwardEntity, StorageError> {
        self.table.upsert(award).await
    }

    /// Deletes each listed award of the team. Ids that no longer exist are
    /// skipped. Returns how many records were removed.
    pub async fn delete_many(
        &self,
        team_id: &str,
        award_ids: &[String],
    ) -> Result<usize, StorageError> {
        let mut removed = 0;
        for award_id in award_ids {
            if self.table.delete(&EntityKey::new(team_id, award_id)).await? {
                removed += 1;
            } else {
                debug!("Award {award_id} of team {team_id} already gone");
            }
        }
        Ok(removed)
    }
}
