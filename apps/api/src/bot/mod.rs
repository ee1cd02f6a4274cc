pub mod commands;
pub mod connector;
pub mod handler;
pub mod schema;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum::http::StatusCode;

use crate::errors::AppError;
use crate::state::AppState;
use schema::Activity;

/// POST /api/messages
///
/// Entry point for activities from the bot channel.
pub async fn messages(
    State(state): State<AppState>,
    Json(activity): Json<Activity>,
) -> Result<Response, AppError> {
    match state.bot.handle(&activity).await? {
        Some(invoke) => Ok(Json(invoke).into_response()),
        None => Ok(StatusCode::OK.into_response()),
    }
}
