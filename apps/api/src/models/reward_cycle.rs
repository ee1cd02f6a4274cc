use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{EntityKey, TableEntity};

/// Generates an integer-coded enum; the tab client sends and expects numbers.
macro_rules! int_coded {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(try_from = "i32", into = "i32")]
        pub enum $name {
            $($variant = $value),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = String;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(format!("{} is not a valid {}", other, stringify!($name))),
                }
            }
        }
    };
}

int_coded!(
    RewardCycleState { InActive = 0, Active = 1 } default InActive
);

int_coded!(
    PublishState { Unpublished = 0, Published = 1 } default Unpublished
);

int_coded!(
    RecurringState { NonRecursive = 0, Recursive = 1 } default NonRecursive
);

int_coded!(
    /// How a recurring cycle ends.
    OccurrenceType { NoEndDate = 0, EndDate = 1, Occurrence = 2 } default NoEndDate
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RewardCycleEntity {
    pub team_id: String,
    #[serde(default)]
    pub cycle_id: String,
    pub reward_cycle_start_date: DateTime<Utc>,
    pub reward_cycle_end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_recurring: RecurringState,
    #[serde(default)]
    pub range_of_occurrence: OccurrenceType,
    #[serde(default)]
    pub number_of_occurrences: i32,
    pub range_of_occurrence_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reward_cycle_state: RewardCycleState,
    #[serde(default)]
    pub result_published: PublishState,
    pub result_published_on: Option<DateTime<Utc>>,
    pub created_by_principal_name: Option<String>,
    pub created_by_object_id: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RewardCycleEntity {
    pub fn start_day(&self) -> NaiveDate {
        self.reward_cycle_start_date.date_naive()
    }

    pub fn end_day(&self) -> NaiveDate {
        self.reward_cycle_end_date.date_naive()
    }

    pub fn is_active(&self) -> bool {
        self.reward_cycle_state == RewardCycleState::Active
    }

    pub fn is_published(&self) -> bool {
        self.result_published == PublishState::Published
    }
}

impl TableEntity for RewardCycleEntity {
    const TABLE: &'static str = "RewardCycle";

    fn key(&self) -> EntityKey {
        EntityKey::new(&self.team_id, &self.cycle_id)
    }

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_states_serialize_as_integers() {
        assert_eq!(serde_json::to_value(RewardCycleState::Active).unwrap(), json!(1));
        assert_eq!(
            serde_json::from_value::<OccurrenceType>(json!(2)).unwrap(),
            OccurrenceType::Occurrence
        );
        assert!(serde_json::from_value::<PublishState>(json!(7)).is_err());
    }

    #[test]
    fn test_cycle_payload_defaults() {
        let cycle: RewardCycleEntity = serde_json::from_value(json!({
            "TeamId": "team-1",
            "RewardCycleStartDate": "2024-05-01T00:00:00Z",
            "RewardCycleEndDate": "2024-05-15T00:00:00Z"
        }))
        .unwrap();

        assert!(cycle.cycle_id.is_empty());
        assert_eq!(cycle.reward_cycle_state, RewardCycleState::InActive);
        assert_eq!(cycle.result_published, PublishState::Unpublished);
        assert_eq!(cycle.end_day(), NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
    }
}
