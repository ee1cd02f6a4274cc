use serde_json::json;
use url::Url;

use super::{adaptive_card, open_url_action};
use crate::bot::schema::{Attachment, TaskModuleDetails};
use crate::strings;

/// Deep link to the app's channel tab.
pub fn manage_rewards_link(manifest_id: &str, team_id: &str) -> String {
    let context = json!({ "channelId": team_id }).to_string();
    match Url::parse_with_params(
        &format!("https://teams.microsoft.com/l/entity/{manifest_id}/RewardAndRecognition"),
        &[("context", context.as_str())],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => "https://teams.microsoft.com".to_string(),
    }
}

/// Announces the admin configured for a team.
pub fn admin_card(details: &TaskModuleDetails, manifest_id: &str) -> Attachment {
    let name = details.admin_name.as_deref().unwrap_or_default();
    let principal_name = details.admin_principal_name.as_deref().unwrap_or_default();
    let note = details
        .note_for_team
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty());
    let team_id = details.team_id.as_deref().unwrap_or_default();

    let mut body = vec![
        json!({
            "type": "TextBlock",
            "text": strings::ADMIN_HEADER,
            "weight": "bolder",
            "size": "large",
        }),
        json!({
            "type": "TextBlock",
            "text": strings::ADMIN_SUBHEADER,
            "spacing": "none",
        }),
        json!({
            "type": "TextBlock",
            "text": strings::admin_name(name, principal_name),
            "wrap": true,
            "spacing": "default",
        }),
    ];
    if let Some(note) = note {
        body.push(json!({
            "type": "TextBlock",
            "text": strings::note_for_team(note),
            "wrap": true,
            "spacing": "default",
        }));
    }

    adaptive_card(
        body,
        vec![open_url_action(
            strings::MANAGE_REWARD_TITLE,
            &manage_rewards_link(manifest_id, team_id),
        )],
    )
}
