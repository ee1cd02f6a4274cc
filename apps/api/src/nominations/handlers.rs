//! Axum route handlers for the Nominations API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::UserClaims;
use crate::endorsements::endorse_count;
use crate::errors::AppError;
use crate::models::nomination::{NominateEntity, PublishResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateQuery {
    pub team_id: String,
    /// Comma-joined object ids of the nominees.
    pub aad_object_id: String,
    pub cycle_id: String,
    pub award_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllNominationsQuery {
    pub team_id: String,
    #[serde(default)]
    pub is_award_granted: bool,
    pub award_cycle_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishQuery {
    pub team_id: String,
    pub nomination_ids: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/nominatedetail/nomination
///
/// Stores a nomination under a fresh id and pushes it into the search index.
/// A failed index push is logged; the nomination stays stored.
pub async fn handle_save_nomination(
    State(state): State<AppState>,
    _claims: UserClaims,
    Json(nomination): Json<NominateEntity>,
) -> Result<Json<NominateEntity>, AppError> {
    if nomination.team_id.trim().is_empty() {
        return Err(AppError::Validation("TeamId cannot be empty".to_string()));
    }

    let stored = state.repos.nominations.store(nomination).await?;
    info!(
        "Stored nomination {} for award {} in team {}",
        stored.nomination_id, stored.award_id, stored.team_id
    );

    if let Err(e) = state.search.index_nomination(&stored).await {
        warn!("Failed to index nomination {}: {e}", stored.nomination_id);
    }
    Ok(Json(stored))
}

/// GET /api/nominatedetail/nominationdetail
///
/// Whether the caller already nominated this set of people for the award in
/// the cycle.
pub async fn handle_nomination_duplicate(
    State(state): State<AppState>,
    claims: UserClaims,
    Query(query): Query<DuplicateQuery>,
) -> Result<Json<bool>, AppError> {
    let duplicate = state
        .repos
        .nominations
        .is_duplicate(
            &query.team_id,
            &query.aad_object_id,
            &query.cycle_id,
            &query.award_id,
            &claims.object_id,
        )
        .await?;
    Ok(Json(duplicate))
}

/// GET /api/nominatedetail/allnominations
///
/// Nominations of a cycle with the number of endorsements each nominee
/// received for the award.
pub async fn handle_all_nominations(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<AllNominationsQuery>,
) -> Result<Json<Vec<PublishResult>>, AppError> {
    let nominations = state
        .repos
        .nominations
        .list(&query.team_id, query.is_award_granted, &query.award_cycle_id)
        .await?;
    let endorsements = state
        .repos
        .endorsements
        .list(&query.team_id, &query.award_cycle_id, None)
        .await?;

    Ok(Json(
        nominations
            .into_iter()
            .map(|nomination| PublishResult {
                endorse_count: endorse_count(
                    &endorsements,
                    &nomination.nominated_to_principal_name,
                    &nomination.award_id,
                ),
                award_cycle: String::new(),
                nomination,
            })
            .collect(),
    ))
}

/// GET /api/nominatedetail/publishnominations
///
/// Grants the listed nominations and returns them.
pub async fn handle_publish_nominations(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<PublishQuery>,
) -> Result<Json<Vec<NominateEntity>>, AppError> {
    let nomination_ids: Vec<String> = query
        .nomination_ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if nomination_ids.is_empty() {
        return Err(AppError::Validation("nominationIds cannot be empty".to_string()));
    }

    let published = state
        .repos
        .nominations
        .publish(&query.team_id, &nomination_ids)
        .await?;
    info!("Published {} nominations in team {}", published.len(), query.team_id);
    Ok(Json(published))
}
