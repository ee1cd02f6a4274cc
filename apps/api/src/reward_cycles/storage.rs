use std::sync::Arc;

use crate::models::reward_cycle::RewardCycleEntity;
use crate::storage::{StorageError, Table, TableStore};

#[derive(Clone)]
pub struct RewardCycleStore {
    table: Table<RewardCycleEntity>,
}

impl RewardCycleStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            table: Table::new(store),
        }
    }

    /// The cycle a team is currently working in: its most recently created
    /// cycle whose results are not yet published.
    pub async fn current(&self, team_id: &str) -> Result<Option<RewardCycleEntity>, StorageError> {
        Ok(self
            .table
            .list_partition(team_id)
            .await?
            .into_iter()
            .filter(|cycle| !cycle.is_published())
            .max_by_key(|cycle| (cycle.created_on, cycle.timestamp)))
    }

    /// The most recently published cycle of a team.
    pub async fn published(&self, team_id: &str) -> Result<Option<RewardCycleEntity>, StorageError> {
        Ok(self
            .table
            .list_partition(team_id)
            .await?
            .into_iter()
            .filter(RewardCycleEntity::is_published)
            .max_by_key(|cycle| (cycle.result_published_on, cycle.created_on)))
    }

    pub async fn upsert(&self, cycle: RewardCycleEntity) -> Result<RewardCycleEntity, StorageError> {
        self.table.upsert(cycle).await
    }

    pub async fn list_all(&self) -> Result<Vec<RewardCycleEntity>, StorageError> {
        self.table.list_all().await
    }

    /// Active cycles of every team.
    pub async fn active_for_all_teams(&self) -> Result<Vec<RewardCycleEntity>, StorageError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(RewardCycleEntity::is_active)
            .collect())
    }
}
