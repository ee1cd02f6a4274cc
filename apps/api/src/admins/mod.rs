pub mod handlers;

use std::sync::Arc;

use crate::models::admin::AdminEntity;
use crate::storage::{EntityKey, StorageError, Table, TableStore};

/// One admin record per team.
#[derive(Clone)]
pub struct AdminStore {
    table: Table<AdminEntity>,
}

impl AdminStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            table: Table::new(store),
        }
    }

    pub async fn get(&self, team_id: &str) -> Result<Option<AdminEntity>, StorageError> {
        self.table.get(&EntityKey::new(team_id, team_id)).await
    }

    pub async fn upsert(&self, admin: AdminEntity) -> Result<AdminEntity, StorageError> {
        self.table.upsert(admin).await
    }
}
