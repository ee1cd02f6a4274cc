use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::models::endorsement::EndorseEntity;
use crate::storage::{StorageError, Table, TableStore};

#[derive(Clone)]
pub struct EndorsementStore {
    table: Table<EndorseEntity>,
}

impl EndorsementStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            table: Table::new(store),
        }
    }

    /// Endorsements of a cycle, optionally narrowed to one nominee.
    pub async fn list(
        &self,
        team_id: &str,
        cycle_id: &str,
        endorsed_to_principal_name: Option<&str>,
    ) -> Result<Vec<EndorseEntity>, StorageError> {
        Ok(self
            .table
            .list_partition(team_id)
            .await?
            .into_iter()
            .filter(|e| e.award_cycle == cycle_id)
            .filter(|e| {
                endorsed_to_principal_name
                    .filter(|upn| !upn.trim().is_empty())
                    .map_or(true, |upn| e.endorsed_to_principal_name == upn)
            })
            .collect())
    }

    /// Records the endorsement unless the endorser already endorsed this
    /// nominee for this award in the cycle. Returns whether a record was
    /// written.
    ///
    /// The check and the write are separate store calls, so two concurrent
    /// requests from the same endorser can both pass the check.
    pub async fn endorse(&self, mut endorsement: EndorseEntity) -> Result<bool, StorageError> {
        let existing = self
            .list(
                &endorsement.team_id,
                &endorsement.award_cycle,
                Some(&endorsement.endorsed_to_principal_name),
            )
            .await?;

        let already_endorsed = existing.iter().any(|e| {
            e.endorse_for_award_id == endorsement.endorse_for_award_id
                && e.endorsed_by_object_id == endorsement.endorsed_by_object_id
        });
        if already_endorsed {
            info!(
                "{} already endorsed {} for award {}",
                endorsement.endorsed_by_object_id,
                endorsement.endorsed_to_principal_name,
                endorsement.endorse_for_award_id
            );
            return Ok(false);
        }

        endorsement.endorse_id = Uuid::new_v4().to_string();
        self.table.upsert(endorsement).await?;
        Ok(true)
    }
}

/// Number of endorsements a nominee received for an award. Principal names
/// and award ids compare case-insensitively.
pub fn endorse_count(
    endorsements: &[EndorseEntity],
    nominee_principal_name: &str,
    award_id: &str,
) -> usize {
    endorsements
        .iter()
        .filter(|e| {
            e.endorsed_to_principal_name
                .eq_ignore_ascii_case(nominee_principal_name)
                && e.endorse_for_award_id.eq_ignore_ascii_case(award_id)
        })
        .count()
}
