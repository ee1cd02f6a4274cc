use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::UserClaims;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSettings {
    pub bot_id: String,
    pub instrumentation_key: Option<String>,
}

/// GET /api/settings/botsettings
pub async fn handle_bot_settings(
    State(state): State<AppState>,
    _claims: UserClaims,
) -> Json<BotSettings> {
    Json(BotSettings {
        bot_id: state.config.bot.app_id.clone(),
        instrumentation_key: state.config.bot.instrumentation_key.clone(),
    })
}
