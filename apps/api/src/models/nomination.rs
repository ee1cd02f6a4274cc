use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{EntityKey, TableEntity};

/// A nomination of one person, or a comma-joined group, for an award in a
/// reward cycle. Mirrored into the search index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NominateEntity {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub nomination_id: String,
    #[serde(default)]
    pub award_name: String,
    #[serde(default)]
    pub award_id: String,
    pub award_image_link: Option<String>,
    pub nominated_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub nominated_to_name: String,
    #[serde(default)]
    pub nominated_to_principal_name: String,
    #[serde(default)]
    pub nominated_to_object_id: String,
    #[serde(default)]
    pub nominated_by_name: String,
    #[serde(default)]
    pub nominated_by_principal_name: String,
    #[serde(default)]
    pub nominated_by_object_id: String,
    #[serde(default)]
    pub reason_for_nomination: String,
    #[serde(default)]
    pub reward_cycle_id: String,
    /// `"1"` or `"0"`, as the tab client sends it.
    #[serde(default)]
    pub is_group_nomination: String,
    pub group_name: Option<String>,
    #[serde(default)]
    pub award_granted: bool,
    pub award_published_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TableEntity for NominateEntity {
    const TABLE: &'static str = "NominateDetail";

    fn key(&self) -> EntityKey {
        EntityKey::new(&self.team_id, &self.nomination_id)
    }

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}

/// A nomination as shown on the publish screen, with its endorsement count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublishResult {
    #[serde(flatten)]
    pub nomination: NominateEntity,
    pub award_cycle: String,
    pub endorse_count: usize,
}

/// One winner row posted by the admin when publishing results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwardWinnerNotification {
    pub team_id: String,
    #[serde(default)]
    pub award_id: String,
    #[serde(default)]
    pub award_name: String,
    pub award_link: Option<String>,
    #[serde(default)]
    pub award_cycle: String,
    #[serde(default)]
    pub nominated_to_name: String,
    #[serde(default)]
    pub nominated_to_principal_name: String,
    #[serde(default)]
    pub nominated_to_object_id: String,
}
