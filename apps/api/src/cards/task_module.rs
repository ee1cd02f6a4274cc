//! Task-module (dialog) responses returned from invokes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::endorse::endorse_status_card;
use super::validation::error_card;
use crate::bot::commands::Command;
use crate::bot::schema::Attachment;
use crate::strings;

const ADMIN_HEIGHT: u32 = 460;
const ADMIN_WIDTH: u32 = 600;
const NOMINATION_HEIGHT: u32 = 600;
const NOMINATION_WIDTH: u32 = 700;
const ERROR_HEIGHT: u32 = 200;
const ERROR_WIDTH: u32 = 400;
const ENDORSE_HEIGHT: u32 = 220;
const ENDORSE_WIDTH: u32 = 480;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskModuleTaskInfo {
    pub title: String,
    pub height: u32,
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskModuleContinue {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: TaskModuleTaskInfo,
}

/// Body of a task-module invoke response. Messaging-extension fetch-task
/// responses share the same shape.
#[derive(Debug, Clone, Serialize)]
pub struct TaskModuleResponse {
    pub task: TaskModuleContinue,
}

impl TaskModuleResponse {
    fn continue_with(value: TaskModuleTaskInfo) -> Self {
        Self {
            task: TaskModuleContinue {
                kind: "continue",
                value,
            },
        }
    }

    fn card(title: &str, card: Attachment, height: u32, width: u32) -> Self {
        Self::continue_with(TaskModuleTaskInfo {
            title: title.to_string(),
            height,
            width,
            url: None,
            fallback_url: None,
            card: Some(card),
        })
    }

    fn page(title: &str, url: String, height: u32, width: u32) -> Self {
        Self::continue_with(TaskModuleTaskInfo {
            title: title.to_string(),
            height,
            width,
            fallback_url: Some(url.clone()),
            url: Some(url),
            card: None,
        })
    }
}

/// Where the hosted pages live and the telemetry key they are handed.
#[derive(Debug, Clone, Copy)]
pub struct TaskModulePages<'a> {
    pub app_base_uri: &'a str,
    pub telemetry: &'a str,
}

impl TaskModulePages<'_> {
    fn base(&self) -> &str {
        self.app_base_uri.trim_end_matches('/')
    }

    pub fn configure_admin(&self, team_id: &str, is_activity_id_present: bool) -> TaskModuleResponse {
        let url = format!(
            "{}/config-admin-page?telemetry={}&teamId={}&isActivityIdPresent={}&theme={{theme}}&locale={{locale}}",
            self.base(),
            self.telemetry,
            team_id,
            is_activity_id_present
        );
        TaskModuleResponse::page(strings::CONFIGURE_ADMIN_TITLE, url, ADMIN_HEIGHT, ADMIN_WIDTH)
    }

    /// Nomination page; without an award the page lets the user pick one.
    pub fn nominate(&self, team_id: &str, award_id: Option<&str>) -> TaskModuleResponse {
        let url = match award_id {
            Some(award_id) => format!(
                "{}/nominate-awards?telemetry={}&teamId={}&awardId={}&theme={{theme}}&locale={{locale}}",
                self.base(),
                self.telemetry,
                team_id,
                award_id
            ),
            None => format!(
                "{}/nominate-awards?telemetry={}&teamId={}&theme={{theme}}&locale={{locale}}",
                self.base(),
                self.telemetry,
                team_id
            ),
        };
        TaskModuleResponse::page(strings::NOMINATE_PEOPLE_TITLE, url, NOMINATION_HEIGHT, NOMINATION_WIDTH)
    }
}

pub fn error_response(title: &str, message: &str) -> TaskModuleResponse {
    TaskModuleResponse::card(title, error_card(message), ERROR_HEIGHT, ERROR_WIDTH)
}

pub fn invalid_team_response() -> TaskModuleResponse {
    error_response(strings::NOMINATE_PEOPLE_TITLE, strings::INVALID_TEAM_TEXT)
}

/// Rejection for a nominate or endorse dialog outside a running cycle.
pub fn cycle_unavailable_response(command: Command, closed: bool) -> TaskModuleResponse {
    let title = if command == Command::Nominate {
        strings::NOMINATE_PEOPLE_TITLE
    } else {
        strings::ENDORSE_TITLE
    };
    let message = if closed {
        strings::CYCLE_CLOSED_MESSAGE
    } else {
        strings::CYCLE_VALIDATION_MESSAGE
    };
    error_response(title, message)
}

pub fn endorse_status_response(
    app_base_uri: &str,
    award_name: &str,
    nominee: &str,
    cycle_end: DateTime<Utc>,
    endorsed: bool,
) -> TaskModuleResponse {
    TaskModuleResponse::card(
        strings::ENDORSE_TITLE,
        endorse_status_card(app_base_uri, award_name, nominee, cycle_end, endorsed),
        ENDORSE_HEIGHT,
        ENDORSE_WIDTH,
    )
}
