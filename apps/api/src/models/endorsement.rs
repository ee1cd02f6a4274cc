use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{EntityKey, TableEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndorseEntity {
    pub team_id: String,
    /// Random row key assigned on store.
    #[serde(default)]
    pub endorse_id: String,
    pub endorse_for_award: String,
    pub endorse_for_award_id: String,
    pub award_cycle: String,
    pub endorsed_to_principal_name: String,
    pub endorsed_to_object_id: String,
    pub endorsed_by_principal_name: String,
    pub endorsed_by_object_id: String,
    pub endorsed_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TableEntity for EndorseEntity {
    const TABLE: &'static str = "EndorseDetail";

    fn key(&self) -> EntityKey {
        EntityKey::new(&self.team_id, &self.endorse_id)
    }

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}
