use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{EntityKey, TableEntity};

/// The reward-and-recognition admin of a team. Reconfiguring replaces the
/// record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminEntity {
    pub team_id: String,
    #[serde(default)]
    pub admin_name: String,
    #[serde(default)]
    pub admin_principal_name: String,
    #[serde(default)]
    pub admin_object_id: String,
    pub note_for_team: Option<String>,
    pub created_by_object_id: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TableEntity for AdminEntity {
    const TABLE: &'static str = "AdminDetail";

    fn key(&self) -> EntityKey {
        EntityKey::new(&self.team_id, &self.team_id)
    }

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}
