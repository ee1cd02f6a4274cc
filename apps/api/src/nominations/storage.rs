use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::models::nomination::NominateEntity;
use crate::nominations::dedup::is_duplicate_nomination;
use crate::storage::{EntityKey, StorageError, Table, TableStore};

#[derive(Clone)]
pub struct NominationStore {
    table: Table<NominateEntity>,
}

impl NominationStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            table: Table::new(store),
        }
    }

    /// Stores a new nomination under a fresh id.
    pub async fn store(&self, mut nomination: NominateEntity) -> Result<NominateEntity, StorageError> {
        nomination.nomination_id = Uuid::new_v4().to_string();
        if nomination.nominated_on.is_none() {
            nomination.nominated_on = Some(Utc::now());
        }
        self.table.upsert(nomination).await
    }

    pub async fn get(
        &self,
        team_id: &str,
        nomination_id: &str,
    ) -> Result<Option<NominateEntity>, StorageError> {
        self.table.get(&EntityKey::new(team_id, nomination_id)).await
    }

    /// Nominations of a cycle, filtered on whether the award was granted.
    pub async fn list(
        &self,
        team_id: &str,
        award_granted: bool,
        cycle_id: &str,
    ) -> Result<Vec<NominateEntity>, StorageError> {
        Ok(self
            .list_cycle(team_id, cycle_id)
            .await?
            .into_iter()
            .filter(|n| n.award_granted == award_granted)
            .collect())
    }

    pub async fn list_cycle(
        &self,
        team_id: &str,
        cycle_id: &str,
    ) -> Result<Vec<NominateEntity>, StorageError> {
        Ok(self
            .table
            .list_partition(team_id)
            .await?
            .into_iter()
            .filter(|n| n.reward_cycle_id == cycle_id)
            .collect())
    }

    /// Whether `nominated_by` already nominated the same set of people for
    /// this award in this cycle.
    pub async fn is_duplicate(
        &self,
        team_id: &str,
        nominee_object_ids: &str,
        cycle_id: &str,
        award_id: &str,
        nominated_by_object_id: &str,
    ) -> Result<bool, StorageError> {
        let existing: Vec<NominateEntity> = self
            .list_cycle(team_id, cycle_id)
            .await?
            .into_iter()
            .filter(|n| n.award_id == award_id && n.nominated_by_object_id == nominated_by_object_id)
            .collect();
        Ok(is_duplicate_nomination(&existing, nominee_object_ids))
    }

    /// Marks the listed nominations as granted. Unknown ids are logged and
    /// skipped. Returns the updated nominations.
    pub async fn publish(
        &self,
        team_id: &str,
        nomination_ids: &[String],
    ) -> Result<Vec<NominateEntity>, StorageError> {
        let published_on = Utc::now();
        let mut published = Vec::with_capacity(nomination_ids.len());
        for nomination_id in nomination_ids {
            let Some(mut nomination) = self.get(team_id, nomination_id).await? else {
                warn!("Cannot publish unknown nomination {nomination_id} of team {team_id}");
                continue;
            };
            nomination.award_granted = true;
            nomination.award_published_on = Some(published_on);
            published.push(self.table.upsert(nomination).await?);
        }
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryTableStore;

    fn nomination(nominator: &str, nominees: &str) -> NominateEntity {
        NominateEntity {
            team_id: "team-1".to_string(),
            award_id: "award-1".to_string(),
            award_name: "Team Player".to_string(),
            reward_cycle_id: "cycle-1".to_string(),
            nominated_by_object_id: nominator.to_string(),
            nominated_to_object_id: nominees.to_string(),
            reason_for_nomination: "Shipped the migration".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_store_assigns_fresh_ids() {
        let nominations = NominationStore::new(Arc::new(MemoryTableStore::new()));
        let first = nominations.store(nomination("oid-x", "oid-a")).await.unwrap();
        let second = nominations.store(nomination("oid-x", "oid-b")).await.unwrap();

        assert!(!first.nomination_id.is_empty());
        assert_ne!(first.nomination_id, second.nomination_id);
        assert!(first.nominated_on.is_some());
    }

    #[tokio::test]
    async fn test_same_nominator_resubmitting_is_duplicate() {
        let nominations = NominationStore::new(Arc::new(MemoryTableStore::new()));
        nominations.store(nomination("oid-x", "oid-a,oid-b")).await.unwrap();

        assert!(nominations
            .is_duplicate("team-1", "oid-b,oid-a", "cycle-1", "award-1", "oid-x")
            .await
            .unwrap());
        assert!(!nominations
            .is_duplicate("team-1", "oid-a,oid-c", "cycle-1", "award-1", "oid-x")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_different_nominator_is_not_duplicate() {
        let nominations = NominationStore::new(Arc::new(MemoryTableStore::new()));
        nominations.store(nomination("oid-x", "oid-a,oid-b")).await.unwrap();

        assert!(!nominations
            .is_duplicate("team-1", "oid-a,oid-b", "cycle-1", "award-1", "oid-y")
            .await
            .unwrap());
        assert!(!nominations
            .is_duplicate("team-1", "oid-a,oid-b", "cycle-2", "award-1", "oid-x")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_publish_grants_listed_nominations() {
        let nominations = NominationStore::new(Arc::new(MemoryTableStore::new()));
        let kept = nominations.store(nomination("oid-x", "oid-a")).await.unwrap();
        let winner = nominations.store(nomination("oid-y", "oid-b")).await.unwrap();

        let published = nominations
            .publish("team-1", &[winner.nomination_id.clone(), "missing".to_string()])
            .await
            .unwrap();

        assert_eq!(published.len(), 1);
        let granted = nominations.list("team-1", true, "cycle-1").await.unwrap();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].nomination_id, winner.nomination_id);
        assert!(granted[0].award_published_on.is_some());

        let pending = nominations.list("team-1", false, "cycle-1").await.unwrap();
        assert_eq!(pending[0].nomination_id, kept.nomination_id);
    }
}
