use chrono::{DateTime, Utc};
use serde_json::json;

use super::{
    adaptive_card, award_header, date_token, information_icon_url, submit_action,
};
use crate::bot::commands::Command;
use crate::bot::schema::{Attachment, TaskModuleDetails};
use crate::strings;

/// Nomination card with an Endorse button. Used for the nomination
/// announcement and for messaging-extension search results.
pub fn endorse_card(app_base_uri: &str, details: &TaskModuleDetails) -> Attachment {
    let award_name = details.award_name.as_deref().unwrap_or_default();
    let nominee = details.nominated_to_name.as_deref().unwrap_or_default();
    let nominator = details.nominated_by_name.as_deref().unwrap_or_default();
    let reason = details.reason_for_nomination.as_deref().unwrap_or_default();

    let action = TaskModuleDetails {
        nominated_to_principal_name: details.nominated_to_principal_name.clone(),
        award_name: details.award_name.clone(),
        nominated_to_name: details.nominated_to_name.clone(),
        nominated_to_object_id: details.nominated_to_object_id.clone(),
        award_id: details.award_id.clone(),
        reward_cycle_id: details.reward_cycle_id.clone(),
        ..TaskModuleDetails::fetch(Command::Endorse.as_str())
    };

    adaptive_card(
        vec![
            award_header(app_base_uri, award_name, details.award_link.as_deref()),
            json!({
                "type": "TextBlock",
                "text": nominee,
                "wrap": true,
                "horizontalAlignment": "left",
                "weight": "bolder",
                "spacing": "large",
            }),
            json!({
                "type": "TextBlock",
                "text": strings::nominated_by(nominator),
                "wrap": true,
                "horizontalAlignment": "left",
                "spacing": "default",
            }),
            json!({
                "type": "TextBlock",
                "text": reason,
                "wrap": true,
                "horizontalAlignment": "left",
                "spacing": "default",
            }),
        ],
        vec![submit_action(strings::ENDORSE_BUTTON, &action)],
    )
}

/// Outcome of an endorsement attempt, dismissed with OK.
pub fn endorse_status_card(
    app_base_uri: &str,
    award_name: &str,
    nominee: &str,
    cycle_end: DateTime<Utc>,
    endorsed: bool,
) -> Attachment {
    let end = date_token(cycle_end);
    let message = if endorsed {
        strings::successful_endorse(award_name, nominee, &end)
    } else {
        strings::already_endorsed(&end)
    };

    adaptive_card(
        vec![json!({
            "type": "ColumnSet",
            "columns": [
                {
                    "type": "Column",
                    "width": "auto",
                    "items": [{
                        "type": "Image",
                        "url": information_icon_url(app_base_uri),
                        "size": "small",
                    }],
                },
                {
                    "type": "Column",
                    "width": "auto",
                    "items": [{
                        "type": "TextBlock",
                        "text": message,
                        "wrap": true,
                        "size": "default",
                    }],
                },
            ],
        })],
        vec![submit_action(
            strings::OK_BUTTON,
            &TaskModuleDetails::message_back(Command::Ok.as_str()),
        )],
    )
}
