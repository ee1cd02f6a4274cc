//! Wire types of the bot connector protocol, limited to the fields this
//! service reads or writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MESSAGE: &str = "message";
pub const CONVERSATION_UPDATE: &str = "conversationUpdate";
pub const INVOKE: &str = "invoke";
pub const TYPING: &str = "typing";

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
pub const THUMBNAIL_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.thumbnail";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl ConversationAccount {
    /// Id of the root message when the conversation id addresses a thread
    /// (`<conversation>;messageid=<activity>`).
    pub fn thread_activity_id(&self) -> Option<&str> {
        self.id
            .split_once(";messageid=")
            .map(|(_, activity_id)| activity_id)
            .filter(|activity_id| !activity_id.is_empty())
    }
}

/// Conversation id of the reply thread under `activity_id`.
pub fn thread_conversation_id(conversation_id: &str, activity_id: &str) -> String {
    let root = conversation_id
        .split_once(";messageid=")
        .map_or(conversation_id, |(root, _)| root);
    format!("{root};messageid={activity_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: Value,
}

impl Attachment {
    pub fn adaptive(content: Value) -> Self {
        Self {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_removed: Vec<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<Value>,
}

impl Activity {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: MESSAGE.to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn typing() -> Self {
        Self {
            activity_type: TYPING.to_string(),
            ..Default::default()
        }
    }

    pub fn attachment(attachment: Attachment) -> Self {
        Self {
            activity_type: MESSAGE.to_string(),
            attachments: vec![attachment],
            ..Default::default()
        }
    }

    pub fn carousel(attachments: Vec<Attachment>) -> Self {
        Self {
            activity_type: MESSAGE.to_string(),
            attachment_layout: Some("carousel".to_string()),
            attachments,
            ..Default::default()
        }
    }

    pub fn teams_channel_data(&self) -> Option<TeamsChannelData> {
        self.channel_data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
    }

    /// Id of the team the activity happened in, if any.
    pub fn team_id(&self) -> Option<String> {
        self.teams_channel_data()
            .and_then(|data| data.team)
            .map(|team| team.id)
    }

    /// Id of the channel the activity happened in, falling back to the team.
    pub fn channel_or_team_id(&self) -> Option<String> {
        let data = self.teams_channel_data()?;
        data.channel
            .map(|channel| channel.id)
            .or_else(|| data.team.map(|team| team.id))
    }

    pub fn from_object_id(&self) -> Option<&str> {
        self.from.as_ref().and_then(|from| from.aad_object_id.as_deref())
    }

    /// The `data` object an invoke carries.
    pub fn invoke_data(&self) -> Value {
        self.value
            .as_ref()
            .and_then(|value| {
                value
                    .as_object()?
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case("data"))
                    .map(|(_, data)| data.clone())
            })
            .unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamsChannelData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelInfo>,
}

impl TeamsChannelData {
    /// Channel data addressing the general channel of a team.
    pub fn for_team(team_id: &str) -> Self {
        Self {
            team: Some(TeamInfo {
                id: team_id.to_string(),
                name: None,
            }),
            channel: Some(ChannelInfo {
                id: team_id.to_string(),
            }),
        }
    }
}

/// A member of a team roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aad_object_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParameters {
    pub is_group: bool,
    pub bot: ChannelAccount,
    pub tenant_id: String,
    pub activity: Activity,
    pub channel_data: TeamsChannelData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResourceResponse {
    #[serde(default)]
    pub id: String,
}

/// The values a card action or task-module dialog submits back to the bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskModuleDetails {
    #[serde(rename = "command", alias = "Command", default)]
    pub command: String,
    #[serde(rename = "msteams", default, skip_serializing_if = "Option::is_none")]
    pub msteams: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_for_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nomination_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominated_to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominated_to_object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominated_to_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominated_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_cycle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_nomination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_cycle_start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_cycle_end_date: Option<DateTime<Utc>>,
}

impl TaskModuleDetails {
    /// Card action data that opens a task module for `command`.
    pub fn fetch(command: &str) -> Self {
        Self {
            command: command.to_string(),
            msteams: Some(json!({ "type": "task/fetch" })),
            ..Default::default()
        }
    }

    /// Card action data that posts `command` back as a message.
    pub fn message_back(command: &str) -> Self {
        Self {
            command: command.to_string(),
            msteams: Some(json!({ "type": "messageBack" })),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionParameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryOptions {
    pub skip: Option<usize>,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionQuery {
    #[serde(default)]
    pub parameters: Vec<MessagingExtensionParameter>,
    #[serde(default)]
    pub query_options: QueryOptions,
}

impl MessagingExtensionQuery {
    /// Text typed into the search box.
    pub fn search_text(&self) -> Option<String> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case("searchText"))
            .and_then(|p| p.value.as_ref())
            .and_then(|value| match value {
                Value::String(text) => Some(text.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
    }
}
