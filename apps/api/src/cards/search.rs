use serde::Serialize;
use serde_json::json;

use super::endorse::endorse_card;
use crate::bot::schema::{Attachment, TaskModuleDetails, THUMBNAIL_CARD_CONTENT_TYPE};
use crate::models::nomination::NominateEntity;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionAttachment {
    #[serde(flatten)]
    pub attachment: Attachment,
    pub preview: Attachment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionResult {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessagingExtensionAttachment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionResponse {
    pub compose_extension: MessagingExtensionResult,
}

impl MessagingExtensionResponse {
    /// Plain text shown in place of results.
    pub fn message(text: &str) -> Self {
        Self {
            compose_extension: MessagingExtensionResult {
                kind: "message",
                text: Some(text.to_string()),
                attachment_layout: None,
                attachments: Vec::new(),
            },
        }
    }
}

/// Search results: each nomination as an endorse card with a thumbnail
/// preview naming the nominee and award.
pub fn search_results(app_base_uri: &str, nominations: &[NominateEntity]) -> MessagingExtensionResponse {
    let attachments = nominations
        .iter()
        .map(|nomination| {
            let details = TaskModuleDetails {
                award_name: Some(nomination.award_name.clone()),
                award_id: Some(nomination.award_id.clone()),
                award_link: nomination.award_image_link.clone(),
                nominated_to_name: Some(nomination.nominated_to_name.clone()),
                nominated_to_principal_name: Some(nomination.nominated_to_principal_name.clone()),
                nominated_to_object_id: Some(nomination.nominated_to_object_id.clone()),
                nominated_by_name: Some(nomination.nominated_by_name.clone()),
                reason_for_nomination: Some(nomination.reason_for_nomination.clone()),
                reward_cycle_id: Some(nomination.reward_cycle_id.clone()),
                ..Default::default()
            };
            MessagingExtensionAttachment {
                attachment: endorse_card(app_base_uri, &details),
                preview: Attachment {
                    content_type: THUMBNAIL_CARD_CONTENT_TYPE.to_string(),
                    content: json!({
                        "title": nomination.nominated_to_name,
                        "subtitle": nomination.award_name,
                    }),
                },
            }
        })
        .collect();

    MessagingExtensionResponse {
        compose_extension: MessagingExtensionResult {
            kind: "result",
            text: None,
            attachment_layout: Some("list"),
            attachments,
        },
    }
}
