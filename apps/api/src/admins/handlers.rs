//! Axum route handlers for admin configuration.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::UserClaims;
use crate::errors::AppError;
use crate::models::admin::AdminEntity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub team_id: Option<String>,
}

/// Roster entry in the shape the admin picker consumes.
#[derive(Debug, Serialize, PartialEq)]
pub struct TeamMember {
    pub content: Option<String>,
    pub header: String,
    pub aadobjectid: String,
}

/// GET /api/configureadmin/teammembers
///
/// Members of the team, read from the team roster through the bot connector.
pub async fn handle_team_members(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Vec<TeamMember>>, AppError> {
    let team_id = query
        .team_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Team ID cannot be empty.".to_string()))?;
    let team = state
        .repos
        .teams
        .get(&team_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team {team_id}")))?;

    let members = state
        .connector
        .get_team_members(&team.service_url, &team_id)
        .await?;
    info!("Fetched {} members of team {team_id}", members.len());

    Ok(Json(
        members
            .into_iter()
            .map(|member| TeamMember {
                content: member.email,
                header: member.name,
                aadobjectid: member.aad_object_id,
            })
            .collect(),
    ))
}

/// POST /api/configureadmin/admindetail
///
/// Replaces the team's admin record.
pub async fn handle_save_admin(
    State(state): State<AppState>,
    claims: UserClaims,
    Json(mut admin): Json<AdminEntity>,
) -> Result<Json<AdminEntity>, AppError> {
    if admin.team_id.trim().is_empty() {
        return Err(AppError::Validation("TeamId cannot be empty".to_string()));
    }
    admin.created_on = Some(Utc::now());
    admin.created_by_object_id = Some(claims.object_id);

    let saved = state.repos.admins.upsert(admin).await?;
    info!("Saved admin {} for team {}", saved.admin_principal_name, saved.team_id);
    Ok(Json(saved))
}

/// GET /api/configureadmin/alladmindetails
///
/// The team's admin, or `null` when none is configured.
pub async fn handle_admin_details(
    State(state): State<AppState>,
    _claims: UserClaims,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Option<AdminEntity>>, AppError> {
    let team_id = query
        .team_id
        .ok_or_else(|| AppError::Validation("teamId is required".to_string()))?;
    Ok(Json(state.repos.admins.get(&team_id).await?))
}
