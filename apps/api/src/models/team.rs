use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{EntityKey, TableEntity};

/// A team the bot is installed in. One record per team, keyed by the team id
/// in both key positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamEntity {
    pub team_id: String,
    pub bot_installed_on: DateTime<Utc>,
    pub service_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TableEntity for TeamEntity {
    const TABLE: &'static str = "TeamConfiguration";

    fn key(&self) -> EntityKey {
        EntityKey::new(&self.team_id, &self.team_id)
    }

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}
