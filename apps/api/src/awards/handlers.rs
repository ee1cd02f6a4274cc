//! Axum route handlers for the Awards API.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::UserClaims;
use crate::errors::AppError;
use crate::models::award::AwardEntity;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub team_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardQuery {
    pub team_id: String,
    pub award_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAwardsQuery {
    pub team_id: Option<String>,
    pub award_ids: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/awards/allawards
///
/// Awards of a team, newest first.
pub async fn handle_all_awards(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Vec<AwardEntity>>, AppError> {
    Ok(Json(state.repos.awards.list(&query.team_id).await?))
}

/// GET /api/awards/awarddetails
pub async fn handle_award_details(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<AwardQuery>,
) -> Result<Json<AwardEntity>, AppError> {
    state
        .repos
        .awards
        .get(&query.team_id, &query.award_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Award {}", query.award_id)))
}

/// POST /api/awards/award
///
/// Creates the award when it has no id yet, otherwise replaces it.
pub async fn handle_save_award(
    State(state): State<AppState>,
    claims: UserClaims,
    Json(mut award): Json<AwardEntity>,
) -> Result<Json<AwardEntity>, AppError> {
    if award.award_name.trim().is_empty() {
        return Err(AppError::Validation("AwardName cannot be empty".to_string()));
    }
    if award.team_id.trim().is_empty() {
        return Err(AppError::Validation("TeamId cannot be empty".to_string()));
    }

    if award.award_id.trim().is_empty() {
        award.award_id = Uuid::new_v4().to_string();
        award.created_on = Some(Utc::now());
        award.created_by = Some(claims.object_id);
        info!("Adding award {} to team {}", award.award_id, award.team_id);
    } else {
        award.modified_by = Some(claims.object_id);
        info!("Updating award {} of team {}", award.award_id, award.team_id);
    }

    Ok(Json(state.repos.awards.upsert(award).await?))
}

/// DELETE /api/awards/awards
///
/// Deletes the comma-separated `awardIds` of a team and returns how many
/// were removed.
pub async fn handle_delete_awards(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<DeleteAwardsQuery>,
) -> Result<Json<usize>, AppError> {
    let (Some(team_id), Some(award_ids)) = (query.team_id, query.award_ids) else {
        return Err(AppError::Validation("teamId and awardIds are required".to_string()));
    };
    let award_ids: Vec<String> = award_ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if award_ids.is_empty() {
        return Err(AppError::Validation("awardIds cannot be empty".to_string()));
    }

    let removed = state.repos.awards.delete_many(&team_id, &award_ids).await?;
    info!("Deleted {removed} awards from team {team_id}");
    Ok(Json(removed))
}
