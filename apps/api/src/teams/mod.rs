use std::sync::Arc;

use crate::models::team::TeamEntity;
use crate::storage::{EntityKey, StorageError, Table, TableStore};

/// Install records for teams the bot is a member of.
#[derive(Clone)]
pub struct TeamStore {
    table: Table<TeamEntity>,
}

impl TeamStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            table: Table::new(store),
        }
    }

    pub async fn get(&self, team_id: &str) -> Result<Option<TeamEntity>, StorageError> {
        self.table.get(&EntityKey::new(team_id, team_id)).await
    }

    pub async fn upsert(&self, team: TeamEntity) -> Result<TeamEntity, StorageError> {
        self.table.upsert(team).await
    }

    pub async fn delete(&self, team_id: &str) -> Result<bool, StorageError> {
        self.table.delete(&EntityKey::new(team_id, team_id)).await
    }
}
