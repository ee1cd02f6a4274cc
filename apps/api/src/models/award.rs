use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{EntityKey, TableEntity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwardEntity {
    pub team_id: String,
    /// Empty on create; the API assigns a fresh id.
    #[serde(default)]
    pub award_id: String,
    #[serde(default)]
    pub award_name: String,
    #[serde(default)]
    pub award_description: String,
    pub award_link: Option<String>,
    pub created_by: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TableEntity for AwardEntity {
    const TABLE: &'static str = "AwardDetail";

    fn key(&self) -> EntityKey {
        EntityKey::new(&self.team_id, &self.award_id)
    }

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}
