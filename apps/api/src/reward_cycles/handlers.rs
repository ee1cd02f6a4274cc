//! Axum route handlers for the Reward Cycle API.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::lifecycle::initial_state;
use crate::auth::UserClaims;
use crate::errors::AppError;
use crate::models::reward_cycle::{
    OccurrenceType, PublishState, RecurringState, RewardCycleEntity, RewardCycleState,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleQuery {
    pub team_id: String,
    #[serde(default = "default_active")]
    pub is_active_cycle: bool,
}

fn default_active() -> bool {
    true
}

/// A cycle as the tab reads it back. Requests carry PascalCase keys, responses
/// camelCase ones.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCycleResponse {
    pub team_id: String,
    pub cycle_id: String,
    pub reward_cycle_start_date: DateTime<Utc>,
    pub reward_cycle_end_date: DateTime<Utc>,
    pub is_recurring: RecurringState,
    pub range_of_occurrence: OccurrenceType,
    pub number_of_occurrences: i32,
    pub range_of_occurrence_end_date: Option<DateTime<Utc>>,
    pub reward_cycle_state: RewardCycleState,
    pub result_published: PublishState,
    pub result_published_on: Option<DateTime<Utc>>,
    pub created_by_principal_name: Option<String>,
    pub created_by_object_id: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<RewardCycleEntity> for RewardCycleResponse {
    fn from(cycle: RewardCycleEntity) -> Self {
        Self {
            team_id: cycle.team_id,
            cycle_id: cycle.cycle_id,
            reward_cycle_start_date: cycle.reward_cycle_start_date,
            reward_cycle_end_date: cycle.reward_cycle_end_date,
            is_recurring: cycle.is_recurring,
            range_of_occurrence: cycle.range_of_occurrence,
            number_of_occurrences: cycle.number_of_occurrences,
            range_of_occurrence_end_date: cycle.range_of_occurrence_end_date,
            reward_cycle_state: cycle.reward_cycle_state,
            result_published: cycle.result_published,
            result_published_on: cycle.result_published_on,
            created_by_principal_name: cycle.created_by_principal_name,
            created_by_object_id: cycle.created_by_object_id,
            created_on: cycle.created_on,
            timestamp: cycle.timestamp,
        }
    }
}

/// GET /api/rewardcycle/rewardcycledetails
///
/// The team's current cycle, or with `isActiveCycle=false` its most recently
/// published one. `null` when there is none.
pub async fn handle_reward_cycle_details(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<CycleQuery>,
) -> Result<Json<Option<RewardCycleResponse>>, AppError> {
    let cycles = &state.repos.reward_cycles;
    let cycle = if query.is_active_cycle {
        cycles.current(&query.team_id).await?
    } else {
        cycles.published(&query.team_id).await?
    };
    Ok(Json(cycle.map(RewardCycleResponse::from)))
}

/// POST /api/rewardcycle/rewardcycle
///
/// Creates the cycle when it has no id yet, otherwise replaces it. The state
/// of an unpublished cycle follows its date window.
pub async fn handle_save_reward_cycle(
    State(state): State<AppState>,
    claims: UserClaims,
    Json(mut cycle): Json<RewardCycleEntity>,
) -> Result<Json<RewardCycleResponse>, AppError> {
    if cycle.team_id.trim().is_empty() {
        return Err(AppError::Validation("TeamId cannot be empty".to_string()));
    }
    if cycle.reward_cycle_end_date <= cycle.reward_cycle_start_date {
        return Err(AppError::Validation(
            "RewardCycleEndDate must be after RewardCycleStartDate".to_string(),
        ));
    }

    let now = Utc::now();
    if cycle.cycle_id.trim().is_empty() {
        cycle.cycle_id = Uuid::new_v4().to_string();
        cycle.created_on = Some(now);
        cycle.created_by_object_id = Some(claims.object_id);
        if cycle.created_by_principal_name.is_none() {
            cycle.created_by_principal_name = claims.upn;
        }
    }
    if !cycle.is_published() {
        cycle.reward_cycle_state = initial_state(&cycle, now.date_naive());
    }

    let saved = state.repos.reward_cycles.upsert(cycle).await?;
    info!(
        "Saved reward cycle {} of team {} ({:?})",
        saved.cycle_id, saved.team_id, saved.reward_cycle_state
    );
    Ok(Json(saved.into()))
}
