//! Date-driven reward-cycle state transitions.
//!
//! A cycle is open on the UTC calendar days in `[start, end)`. The periodic
//! status check closes active cycles whose end day has arrived and opens
//! unpublished cycles whose start day has arrived.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::reward_cycle::{RewardCycleEntity, RewardCycleState};
use crate::reward_cycles::RewardCycleStore;
use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleReport {
    pub activated: usize,
    pub closed: usize,
}

/// State a cycle should be saved with, given today's date.
pub fn initial_state(cycle: &RewardCycleEntity, today: NaiveDate) -> RewardCycleState {
    if cycle.start_day() <= today && today < cycle.end_day() {
        RewardCycleState::Active
    } else {
        RewardCycleState::InActive
    }
}

/// The state change due for `cycle` today, if any.
pub fn due_transition(cycle: &RewardCycleEntity, today: NaiveDate) -> Option<RewardCycleState> {
    match cycle.reward_cycle_state {
        RewardCycleState::Active if cycle.end_day() <= today => Some(RewardCycleState::InActive),
        RewardCycleState::InActive
            if !cycle.is_published() && initial_state(cycle, today) == RewardCycleState::Active =>
        {
            Some(RewardCycleState::Active)
        }
        _ => None,
    }
}

/// Applies every due transition across all teams.
pub async fn check_or_update_cycle_status(
    cycles: &RewardCycleStore,
    now: DateTime<Utc>,
) -> Result<LifecycleReport, StorageError> {
    let today = now.date_naive();
    let mut report = LifecycleReport::default();

    for mut cycle in cycles.list_all().await? {
        let Some(next) = due_transition(&cycle, today) else {
            continue;
        };
        info!(
            "Reward cycle {} of team {} moves to {:?}",
            cycle.cycle_id, cycle.team_id, next
        );
        match next {
            RewardCycleState::Active => report.activated += 1,
            RewardCycleState::InActive => report.closed += 1,
        }
        cycle.reward_cycle_state = next;
        cycles.upsert(cycle).await?;
    }

    Ok(report)
}
