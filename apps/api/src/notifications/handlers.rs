use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::auth::UserClaims;
use crate::errors::AppError;
use crate::models::nomination::AwardWinnerNotification;
use crate::state::AppState;

/// POST /api/notification/winnernotification
///
/// Announces the published winners in the team channel.
pub async fn winner_notification(
    State(state): State<AppState>,
    claims: UserClaims,
    Json(winners): Json<Vec<AwardWinnerNotification>>,
) -> Result<StatusCode, AppError> {
    if winners.is_empty() {
        return Err(AppError::Validation("No winners to announce".to_string()));
    }
    info!("Sending winner notification for {} nominations", winners.len());
    state
        .notifier
        .notify_winners(&winners, Some(&claims.object_id))
        .await?;
    Ok(StatusCode::OK)
}
