//! Adaptive cards and invoke responses. Everything here is a pure function of
//! its inputs.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::bot::schema::{Attachment, TaskModuleDetails};

pub mod admin;
pub mod endorse;
pub mod nominate;
pub mod search;
pub mod task_module;
pub mod validation;
pub mod welcome;
pub mod winner;

pub const ADAPTIVE_CARD_VERSION: &str = "1.2";

pub fn adaptive_card(body: Vec<Value>, actions: Vec<Value>) -> Attachment {
    let mut card = json!({
        "type": "AdaptiveCard",
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "version": ADAPTIVE_CARD_VERSION,
        "body": body,
    });
    if !actions.is_empty() {
        card["actions"] = Value::Array(actions);
    }
    Attachment::adaptive(card)
}

pub fn text_block(text: &str) -> Value {
    json!({ "type": "TextBlock", "text": text, "wrap": true })
}

pub fn submit_action(title: &str, data: &TaskModuleDetails) -> Value {
    json!({
        "type": "Action.Submit",
        "title": title,
        "data": data,
    })
}

pub fn open_url_action(title: &str, url: &str) -> Value {
    json!({ "type": "Action.OpenUrl", "title": title, "url": url })
}

/// Award image, or the bundled default when the award has none.
pub fn award_image_url(app_base_uri: &str, award_link: Option<&str>) -> String {
    match award_link.map(str::trim).filter(|link| !link.is_empty()) {
        Some(link) => link.to_string(),
        None => format!("{}/Content/DefaultAwardImage.png", app_base_uri.trim_matches('/')),
    }
}

pub fn information_icon_url(app_base_uri: &str) -> String {
    format!("{}/Content/InformationIcon.png", app_base_uri.trim_matches('/'))
}

/// Date placeholder the client renders in the reader's locale.
pub fn date_token(date: DateTime<Utc>) -> String {
    format!("{{{{DATE({}, SHORT)}}}}", date.format("%Y-%m-%dT%H:%M:%SZ"))
}

/// Award name on the left, award image on the right.
pub fn award_header(app_base_uri: &str, award_name: &str, award_link: Option<&str>) -> Value {
    json!({
        "type": "ColumnSet",
        "columns": [
            {
                "type": "Column",
                "width": "50",
                "items": [{
                    "type": "TextBlock",
                    "text": award_name,
                    "wrap": true,
                    "horizontalAlignment": "left",
                    "weight": "bolder",
                    "size": "large",
                }],
            },
            {
                "type": "Column",
                "width": "100",
                "items": [{
                    "type": "Image",
                    "url": award_image_url(app_base_uri, award_link),
                    "horizontalAlignment": "right",
                    "height": "80px",
                    "width": "110px",
                }],
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_award_image_falls_back_to_default() {
        assert_eq!(
            award_image_url("https://rnr.example.com/", None),
            "https://rnr.example.com/Content/DefaultAwardImage.png"
        );
        assert_eq!(
            award_image_url("https://rnr.example.com", Some("  ")),
            "https://rnr.example.com/Content/DefaultAwardImage.png"
        );
        assert_eq!(
            award_image_url("https://rnr.example.com", Some("https://cdn.example.com/a.png")),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_date_token() {
        let date = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        assert_eq!(date_token(date), "{{DATE(2024-05-15T00:00:00Z, SHORT)}}");
    }

    #[test]
    fn test_card_omits_empty_actions() {
        let card = adaptive_card(vec![text_block("hi")], vec![]);
        assert_eq!(card.content_type, "application/vnd.microsoft.card.adaptive");
        assert!(card.content.get("actions").is_none());
        assert_eq!(card.content["version"], ADAPTIVE_CARD_VERSION);
    }
}
