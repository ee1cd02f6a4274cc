//! Turn handling for inbound bot activities.
//!
//! Every activity is classified into an [`ActivityRoute`] and handed to one
//! handler method. Invokes answer with an [`InvokeResponse`] that becomes the
//! HTTP body; everything else answers through the connector.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::commands::Command;
use super::connector::BotConnector;
use super::schema::{
    thread_conversation_id, Activity, MessagingExtensionQuery, ResourceResponse,
    TaskModuleDetails, INVOKE,
};
use crate::cards::admin::admin_card;
use crate::cards::endorse::endorse_card;
use crate::cards::nominate::nominate_carousel;
use crate::cards::search::{search_results, MessagingExtensionResponse};
use crate::cards::task_module::{
    cycle_unavailable_response, endorse_status_response, error_response, invalid_team_response,
    TaskModulePages, TaskModuleResponse,
};
use crate::cards::welcome::welcome_card;
use crate::config::BotConfig;
use crate::errors::AppError;
use crate::models::endorsement::EndorseEntity;
use crate::models::reward_cycle::RewardCycleEntity;
use crate::models::team::TeamEntity;
use crate::notifications::mentions::{mention_activity, split_addresses, MentionKind};
use crate::search::NominationSearch;
use crate::storage::Repositories;
use crate::strings;

pub const ME_FETCH_TASK: &str = "composeExtension/fetchTask";
pub const ME_QUERY: &str = "composeExtension/query";
pub const ME_SUBMIT_ACTION: &str = "composeExtension/submitAction";
pub const TASK_FETCH: &str = "task/fetch";
pub const TASK_SUBMIT: &str = "task/submit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityRoute {
    Message,
    MembersAdded,
    MembersRemoved,
    MessagingExtensionFetchTask,
    MessagingExtensionQuery,
    MessagingExtensionSubmitAction,
    TaskModuleFetch,
    TaskModuleSubmit,
    Unhandled,
}

impl ActivityRoute {
    pub fn classify(activity: &Activity) -> Self {
        match activity.activity_type.as_str() {
            super::schema::MESSAGE => ActivityRoute::Message,
            super::schema::CONVERSATION_UPDATE if !activity.members_added.is_empty() => {
                ActivityRoute::MembersAdded
            }
            super::schema::CONVERSATION_UPDATE if !activity.members_removed.is_empty() => {
                ActivityRoute::MembersRemoved
            }
            INVOKE => match activity.name.as_deref() {
                Some(ME_FETCH_TASK) => ActivityRoute::MessagingExtensionFetchTask,
                Some(ME_QUERY) => ActivityRoute::MessagingExtensionQuery,
                Some(ME_SUBMIT_ACTION) => ActivityRoute::MessagingExtensionSubmitAction,
                Some(TASK_FETCH) => ActivityRoute::TaskModuleFetch,
                Some(TASK_SUBMIT) => ActivityRoute::TaskModuleSubmit,
                _ => ActivityRoute::Unhandled,
            },
            _ => ActivityRoute::Unhandled,
        }
    }
}

/// Synchronous answer to an invoke.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InvokeResponse {
    TaskModule(TaskModuleResponse),
    MessagingExtension(MessagingExtensionResponse),
}

#[derive(Clone)]
pub struct BotHandler {
    bot: BotConfig,
    repos: Repositories,
    search: Arc<dyn NominationSearch>,
    connector: Arc<dyn BotConnector>,
}

impl BotHandler {
    pub fn new(
        bot: BotConfig,
        repos: Repositories,
        search: Arc<dyn NominationSearch>,
        connector: Arc<dyn BotConnector>,
    ) -> Self {
        Self {
            bot,
            repos,
            search,
            connector,
        }
    }

    fn pages(&self) -> TaskModulePages<'_> {
        TaskModulePages {
            app_base_uri: &self.bot.app_base_uri,
            telemetry: self.bot.instrumentation_key.as_deref().unwrap_or_default(),
        }
    }

    pub async fn handle(&self, activity: &Activity) -> Result<Option<InvokeResponse>, AppError> {
        let route = ActivityRoute::classify(activity);
        match route {
            ActivityRoute::Message => self.on_message(activity).await.map(|_| None),
            ActivityRoute::MembersAdded => self.on_members_added(activity).await.map(|_| None),
            ActivityRoute::MembersRemoved => self.on_members_removed(activity).await.map(|_| None),
            ActivityRoute::MessagingExtensionFetchTask => self
                .on_messaging_extension_fetch_task(activity)
                .await
                .map(|r| Some(InvokeResponse::TaskModule(r))),
            ActivityRoute::MessagingExtensionQuery => self
                .on_messaging_extension_query(activity)
                .await
                .map(|r| Some(InvokeResponse::MessagingExtension(r))),
            ActivityRoute::MessagingExtensionSubmitAction => {
                let result = self.on_messaging_extension_submit_action(activity).await;
                self.report_failure(activity, route, result).await.map(|_| None)
            }
            ActivityRoute::TaskModuleFetch => self
                .on_task_module_fetch(activity)
                .await
                .map(|r| r.map(InvokeResponse::TaskModule)),
            ActivityRoute::TaskModuleSubmit => {
                let result = self.on_task_module_submit(activity).await;
                self.report_failure(activity, route, result).await.map(|_| None)
            }
            ActivityRoute::Unhandled => {
                info!(
                    "Ignoring activity type={} name={:?}",
                    activity.activity_type, activity.name
                );
                Ok(None)
            }
        }
    }

    /// Tells the user a submission failed, then hands the error back.
    async fn report_failure(
        &self,
        activity: &Activity,
        route: ActivityRoute,
        result: Result<(), AppError>,
    ) -> Result<(), AppError> {
        if let Err(e) = &result {
            error!("Error handling {route:?}: {e}");
            if let Err(send_error) = self
                .reply(activity, &Activity::message(strings::ERROR_MESSAGE))
                .await
            {
                warn!("Failed to send the error message: {send_error}");
            }
        }
        result
    }

    async fn on_message(&self, activity: &Activity) -> Result<(), AppError> {
        if let Err(e) = self.reply(activity, &Activity::typing()).await {
            warn!("Failed to send a typing indicator: {e}");
        }
        self.reply(activity, &Activity::message(strings::UNSUPPORTED_BOT_COMMAND))
            .await?;
        Ok(())
    }

    async fn on_members_added(&self, activity: &Activity) -> Result<(), AppError> {
        info!(
            "conversationType: {:?}, membersAdded: {}",
            activity.conversation.as_ref().and_then(|c| c.conversation_type.as_deref()),
            activity.members_added.len()
        );
        if !self.bot_in(activity, &activity.members_added) {
            return Ok(());
        }

        info!("Bot added to {}", conversation_id(activity)?);
        self.reply(activity, &Activity::attachment(welcome_card(&self.bot.app_base_uri)))
            .await?;

        match activity.team_id() {
            Some(team_id) => {
                self.repos
                    .teams
                    .upsert(TeamEntity {
                        team_id,
                        bot_installed_on: Utc::now(),
                        service_url: service_url(activity)?.to_string(),
                        timestamp: None,
                    })
                    .await?;
            }
            None => info!("Bot installed outside a team; nothing to record"),
        }
        Ok(())
    }

    async fn on_members_removed(&self, activity: &Activity) -> Result<(), AppError> {
        info!(
            "conversationType: {:?}, membersRemoved: {}",
            activity.conversation.as_ref().and_then(|c| c.conversation_type.as_deref()),
            activity.members_removed.len()
        );
        let Some(team_id) = activity.team_id() else {
            return Ok(());
        };

        let admin = self.repos.admins.get(&team_id).await?;
        let admin_removed = admin.as_ref().is_some_and(|admin| {
            activity
                .members_removed
                .iter()
                .any(|member| member.aad_object_id.as_deref() == Some(admin.admin_object_id.as_str()))
        });

        if admin_removed {
            info!("Admin removed from team {team_id}");
            self.reply(activity, &Activity::attachment(welcome_card(&self.bot.app_base_uri)))
                .await?;
        } else if self.bot_in(activity, &activity.members_removed) {
            info!("Bot removed from team {team_id}");
            if !self.repos.teams.delete(&team_id).await? {
                info!("No installation record to remove for team {team_id}");
            }
        }
        Ok(())
    }

    async fn on_messaging_extension_fetch_task(
        &self,
        activity: &Activity,
    ) -> Result<TaskModuleResponse, AppError> {
        let Some(team_id) = self.installed_team_id(activity).await? else {
            return Ok(invalid_team_response());
        };

        let cycle = self.repos.reward_cycles.current(&team_id).await?;
        if !cycle.as_ref().is_some_and(RewardCycleEntity::is_active) {
            return Ok(error_response(
                strings::NOMINATE_PEOPLE_TITLE,
                strings::CYCLE_VALIDATION_MESSAGE,
            ));
        }
        Ok(self.pages().nominate(&team_id, None))
    }

    async fn on_messaging_extension_query(
        &self,
        activity: &Activity,
    ) -> Result<MessagingExtensionResponse, AppError> {
        let Some(team_id) = self.installed_team_id(activity).await? else {
            return Ok(MessagingExtensionResponse::message(strings::INVALID_TEAM_TEXT));
        };

        let query: MessagingExtensionQuery = match &activity.value {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| AppError::Validation(format!("Invalid query: {e}")))?,
            None => MessagingExtensionQuery::default(),
        };

        let Some(cycle) = self.repos.reward_cycles.current(&team_id).await? else {
            return Ok(MessagingExtensionResponse::message(
                strings::CYCLE_VALIDATION_MESSAGE,
            ));
        };

        let nominations = self
            .search
            .search_nominations(
                query.search_text().as_deref(),
                &cycle.cycle_id,
                &team_id,
                query.query_options.count,
                query.query_options.skip,
            )
            .await?;
        Ok(search_results(&self.bot.app_base_uri, &nominations))
    }

    async fn on_messaging_extension_submit_action(&self, activity: &Activity) -> Result<(), AppError> {
        let details = submitted_details(activity)?;
        if Command::parse(&details.command) == Some(Command::SaveNominatedDetails) {
            self.announce_nomination(activity, &details).await?;
        }
        Ok(())
    }

    async fn on_task_module_fetch(
        &self,
        activity: &Activity,
    ) -> Result<Option<TaskModuleResponse>, AppError> {
        let details = submitted_details(activity)?;
        let Some(team_id) = activity.team_id() else {
            return Ok(Some(invalid_team_response()));
        };
        let Some(command) = Command::parse(&details.command) else {
            info!("Invalid command for task module fetch: {}", details.command);
            self.reply(activity, &Activity::message(strings::ERROR_MESSAGE))
                .await?;
            return Ok(None);
        };

        let cycle = self.repos.reward_cycles.current(&team_id).await?;
        if command != Command::ConfigureAdmin {
            match &cycle {
                Some(cycle) if details.reward_cycle_id.as_deref() != Some(cycle.cycle_id.as_str()) => {
                    return Ok(Some(cycle_unavailable_response(command, true)));
                }
                Some(cycle) if cycle.is_active() => {}
                _ => return Ok(Some(cycle_unavailable_response(command, false))),
            }
        }

        match (command, cycle) {
            (Command::ConfigureAdmin, _) => {
                let is_activity_id_present = activity
                    .conversation
                    .as_ref()
                    .and_then(|c| c.thread_activity_id())
                    .is_some();
                info!("Opening the configure admin dialog for team {team_id}");
                Ok(Some(self.pages().configure_admin(&team_id, is_activity_id_present)))
            }
            (Command::Endorse, Some(cycle)) => {
                let endorsed = self.endorse(activity, &team_id, &details).await?;
                info!("Endorsement for {team_id}: recorded={endorsed}");
                Ok(Some(endorse_status_response(
                    &self.bot.app_base_uri,
                    details.award_name.as_deref().unwrap_or_default(),
                    details.nominated_to_name.as_deref().unwrap_or_default(),
                    cycle.reward_cycle_end_date,
                    endorsed,
                )))
            }
            (Command::Nominate, _) => {
                info!("Opening the nomination dialog for team {team_id}");
                Ok(Some(self.pages().nominate(&team_id, details.award_id.as_deref())))
            }
            (other, _) => {
                info!("Invalid command for task module fetch: {other}");
                self.reply(activity, &Activity::message(strings::ERROR_MESSAGE))
                    .await?;
                Ok(None)
            }
        }
    }

    async fn on_task_module_submit(&self, activity: &Activity) -> Result<(), AppError> {
        let details = submitted_details(activity)?;

        match Command::parse(&details.command) {
            Some(Command::SaveAdminDetails) => {
                let card = Activity::attachment(admin_card(&details, &self.bot.manifest_id));
                let posted = self.reply(activity, &card).await?;
                let thread = thread_conversation_id(conversation_id(activity)?, &posted.id);
                let mention = self
                    .mention(activity, &details, details.admin_principal_name.as_deref(), MentionKind::SetAdmin)
                    .await?;
                self.send(activity, &thread, &mention).await?;
                info!("Admin configured");
            }
            Some(Command::UpdateAdminDetail) => {
                let conversation = conversation_id(activity)?;
                let activity_id = activity
                    .conversation
                    .as_ref()
                    .and_then(|c| c.thread_activity_id())
                    .ok_or_else(|| AppError::Validation("No admin card to update".to_string()))?;
                let card = Activity::attachment(admin_card(&details, &self.bot.manifest_id));
                self.connector
                    .update_activity(service_url(activity)?, conversation, activity_id, &card)
                    .await?;
                let mention = self
                    .mention(activity, &details, details.admin_principal_name.as_deref(), MentionKind::SetAdmin)
                    .await?;
                self.reply(activity, &mention).await?;
                info!("Admin card updated");
            }
            Some(Command::Nominate) => {
                let team_id = submitted_team_id(activity, &details)?;
                let (Some(start), Some(end)) =
                    (details.reward_cycle_start_date, details.reward_cycle_end_date)
                else {
                    return Err(AppError::Validation("Missing reward cycle dates".to_string()));
                };
                let awards = self.repos.awards.list(&team_id).await?;
                let carousel = Activity::carousel(nominate_carousel(
                    &self.bot.app_base_uri,
                    &awards,
                    details.reward_cycle_id.as_deref().unwrap_or_default(),
                    start,
                    end,
                ));
                self.reply(activity, &carousel).await?;
            }
            Some(Command::SaveNominatedDetails) => {
                self.announce_nomination(activity, &details).await?;
            }
            Some(Command::Cancel) | Some(Command::Ok) => {}
            _ => {
                info!("Invalid command for task module submit: {}", details.command);
                self.reply(activity, &Activity::message(strings::ERROR_MESSAGE))
                    .await?;
            }
        }
        Ok(())
    }

    /// Posts the nomination card in the team channel and mentions the
    /// nominees in its thread.
    async fn announce_nomination(
        &self,
        activity: &Activity,
        details: &TaskModuleDetails,
    ) -> Result<(), AppError> {
        let team_id = submitted_team_id(activity, details)?;
        let card = Activity::attachment(endorse_card(&self.bot.app_base_uri, details));
        let posted = self.send(activity, &team_id, &card).await?;

        let mention = self
            .mention(
                activity,
                details,
                details.nominated_to_principal_name.as_deref(),
                MentionKind::Nomination,
            )
            .await?;
        self.send(activity, &thread_conversation_id(&team_id, &posted.id), &mention)
            .await?;
        info!("Nomination announced in team {team_id}");
        Ok(())
    }

    /// Records an endorsement from the caller. Returns false when the caller
    /// already endorsed this nominee for this award in the cycle.
    async fn endorse(
        &self,
        activity: &Activity,
        team_id: &str,
        details: &TaskModuleDetails,
    ) -> Result<bool, AppError> {
        let caller_id = activity
            .from_object_id()
            .ok_or_else(|| AppError::Validation("Activity has no sender".to_string()))?;
        let roster = self
            .connector
            .get_team_members(service_url(activity)?, team_id)
            .await?;
        let caller = roster
            .iter()
            .find(|member| member.aad_object_id == caller_id)
            .ok_or_else(|| AppError::NotFound(format!("Team member {caller_id}")))?;

        let endorsement = EndorseEntity {
            team_id: team_id.to_string(),
            endorse_id: String::new(),
            endorse_for_award: details.award_name.clone().unwrap_or_default(),
            endorse_for_award_id: details.award_id.clone().unwrap_or_default(),
            award_cycle: details.reward_cycle_id.clone().unwrap_or_default(),
            endorsed_to_principal_name: details.nominated_to_principal_name.clone().unwrap_or_default(),
            endorsed_to_object_id: details.nominated_to_object_id.clone().unwrap_or_default(),
            endorsed_by_principal_name: caller
                .email
                .clone()
                .or_else(|| caller.user_principal_name.clone())
                .unwrap_or_default(),
            endorsed_by_object_id: caller.aad_object_id.clone(),
            endorsed_on: Utc::now(),
            timestamp: None,
        };
        Ok(self.repos.endorsements.endorse(endorsement).await?)
    }

    async fn mention(
        &self,
        activity: &Activity,
        details: &TaskModuleDetails,
        addresses: Option<&str>,
        kind: MentionKind,
    ) -> Result<Activity, AppError> {
        let team_id = submitted_team_id(activity, details)?;
        let roster = self
            .connector
            .get_team_members(service_url(activity)?, &team_id)
            .await?;
        Ok(mention_activity(
            &roster,
            &split_addresses(addresses.unwrap_or_default()),
            activity.from_object_id(),
            kind,
        ))
    }

    /// Team id of an invoke, if the team has an installation record.
    async fn installed_team_id(&self, activity: &Activity) -> Result<Option<String>, AppError> {
        let Some(team_id) = activity.team_id() else {
            return Ok(None);
        };
        Ok(self
            .repos
            .teams
            .get(&team_id)
            .await?
            .filter(|team| team.team_id == team_id)
            .map(|team| team.team_id))
    }

    fn bot_in(&self, activity: &Activity, members: &[super::schema::ChannelAccount]) -> bool {
        let Some(recipient) = activity.recipient.as_ref() else {
            return false;
        };
        members.iter().any(|member| member.id == recipient.id)
    }

    async fn reply(&self, activity: &Activity, reply: &Activity) -> Result<ResourceResponse, AppError> {
        self.send(activity, conversation_id(activity)?, reply).await
    }

    async fn send(
        &self,
        activity: &Activity,
        conversation_id: &str,
        message: &Activity,
    ) -> Result<ResourceResponse, AppError> {
        Ok(self
            .connector
            .send_to_conversation(service_url(activity)?, conversation_id, message)
            .await?)
    }
}

fn service_url(activity: &Activity) -> Result<&str, AppError> {
    activity
        .service_url
        .as_deref()
        .ok_or_else(|| AppError::Validation("Activity has no serviceUrl".to_string()))
}

fn conversation_id(activity: &Activity) -> Result<&str, AppError> {
    activity
        .conversation
        .as_ref()
        .map(|c| c.id.as_str())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Activity has no conversation".to_string()))
}

fn submitted_details(activity: &Activity) -> Result<TaskModuleDetails, AppError> {
    serde_json::from_value(activity.invoke_data())
        .map_err(|e| AppError::Validation(format!("Invalid task module data: {e}")))
}

fn submitted_team_id(activity: &Activity, details: &TaskModuleDetails) -> Result<String, AppError> {
    details
        .team_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| activity.team_id())
        .ok_or_else(|| AppError::Validation("Missing team id".to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use serde_json::{json, Value};

    use super::*;
    use crate::bot::connector::fake::{ConnectorCall, RecordingConnector};
    use crate::bot::schema::TeamsChannelAccount;
    use crate::models::award::AwardEntity;
    use crate::models::reward_cycle::RewardCycleState;
    use crate::reward_cycles::storage::tests::cycle;
    use crate::search::TableScanSearch;

    const TEAM: &str = "19:team@thread.skype";
    const SERVICE_URL: &str = "https://smba.example.com/amer/";

    fn roster() -> Vec<TeamsChannelAccount> {
        ["kim", "riley"]
            .into_iter()
            .map(|name| TeamsChannelAccount {
                id: format!("29:{name}"),
                name: name.to_string(),
                aad_object_id: format!("oid-{name}"),
                email: Some(format!("{name}@contoso.com")),
                user_principal_name: None,
            })
            .collect()
    }

    fn handler(repos: &Repositories, connector: Arc<RecordingConnector>) -> BotHandler {
        BotHandler::new(
            BotConfig::for_tests(),
            repos.clone(),
            Arc::new(TableScanSearch::new(repos.nominations.clone())),
            connector,
        )
    }

    fn activity(raw: Value) -> Activity {
        let mut base = json!({
            "serviceUrl": SERVICE_URL,
            "from": { "id": "29:kim", "aadObjectId": "oid-kim" },
            "recipient": { "id": "28:bot" },
            "conversation": { "id": TEAM },
            "channelData": { "team": { "id": TEAM }, "channel": { "id": TEAM } },
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut base, raw) {
            base.extend(extra);
        }
        serde_json::from_value(base).unwrap()
    }

    fn invoke(name: &str, data: Value) -> Activity {
        activity(json!({ "type": "invoke", "name": name, "value": { "data": data } }))
    }

    async fn install(repos: &Repositories) {
        repos
            .teams
            .upsert(TeamEntity {
                team_id: TEAM.to_string(),
                bot_installed_on: Utc::now(),
                service_url: SERVICE_URL.to_string(),
                timestamp: None,
            })
            .await
            .unwrap();
    }

    async fn running_cycle(repos: &Repositories) -> RewardCycleEntity {
        let now: DateTime<Utc> = Utc::now();
        repos
            .reward_cycles
            .upsert(cycle(
                TEAM,
                "cycle-1",
                now - Duration::days(5),
                now + Duration::days(5),
                RewardCycleState::Active,
            ))
            .await
            .unwrap()
    }

    fn task_value(response: Option<InvokeResponse>) -> Value {
        serde_json::to_value(response.expect("invoke response")).unwrap()
    }

    #[test]
    fn test_classify_routes() {
        let cases = [
            (json!({ "type": "message" }), ActivityRoute::Message),
            (
                json!({ "type": "conversationUpdate", "membersAdded": [{ "id": "28:bot" }] }),
                ActivityRoute::MembersAdded,
            ),
            (
                json!({ "type": "conversationUpdate", "membersRemoved": [{ "id": "29:x" }] }),
                ActivityRoute::MembersRemoved,
            ),
            (json!({ "type": "conversationUpdate" }), ActivityRoute::Unhandled),
            (
                json!({ "type": "invoke", "name": "composeExtension/query" }),
                ActivityRoute::MessagingExtensionQuery,
            ),
            (
                json!({ "type": "invoke", "name": "task/submit" }),
                ActivityRoute::TaskModuleSubmit,
            ),
            (
                json!({ "type": "invoke", "name": "signin/verifyState" }),
                ActivityRoute::Unhandled,
            ),
        ];
        for (raw, route) in cases {
            assert_eq!(ActivityRoute::classify(&activity(raw)), route);
        }
    }

    #[tokio::test]
    async fn test_message_gets_unsupported_reply() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::default());
        let response = handler(&repos, connector.clone())
            .handle(&activity(json!({ "type": "message", "text": "hello" })))
            .await
            .unwrap();
        assert!(response.is_none());

        let sent = connector.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1.activity_type, "typing");
        assert_eq!(sent[1].1.text.as_deref(), Some(strings::UNSUPPORTED_BOT_COMMAND));
    }

    #[tokio::test]
    async fn test_install_records_team_and_welcomes() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::default());
        handler(&repos, connector.clone())
            .handle(&activity(json!({
                "type": "conversationUpdate",
                "membersAdded": [{ "id": "28:bot" }],
            })))
            .await
            .unwrap();

        let team = repos.teams.get(TEAM).await.unwrap().unwrap();
        assert_eq!(team.service_url, SERVICE_URL);
        let sent = connector.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].1.attachments[0].content["actions"][0]["data"]["command"],
            "CONFIGUREADMIN"
        );
    }

    #[tokio::test]
    async fn test_bot_removal_deletes_team() {
        let repos = Repositories::in_memory();
        install(&repos).await;
        let connector = Arc::new(RecordingConnector::default());
        handler(&repos, connector.clone())
            .handle(&activity(json!({
                "type": "conversationUpdate",
                "membersRemoved": [{ "id": "28:bot" }],
            })))
            .await
            .unwrap();
        assert!(repos.teams.get(TEAM).await.unwrap().is_none());
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_task_rejects_unknown_team() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::default());
        let response = handler(&repos, connector)
            .handle(&invoke(ME_FETCH_TASK, json!({})))
            .await
            .unwrap();
        let value = task_value(response);
        assert_eq!(
            value["task"]["value"]["card"]["content"]["body"][0]["text"],
            strings::INVALID_TEAM_TEXT
        );
    }

    #[tokio::test]
    async fn test_fetch_task_opens_nomination_page_during_cycle() {
        let repos = Repositories::in_memory();
        install(&repos).await;
        let connector = Arc::new(RecordingConnector::default());
        let h = handler(&repos, connector);

        let idle = task_value(h.handle(&invoke(ME_FETCH_TASK, json!({}))).await.unwrap());
        assert_eq!(
            idle["task"]["value"]["card"]["content"]["body"][0]["text"],
            strings::CYCLE_VALIDATION_MESSAGE
        );

        running_cycle(&repos).await;
        let open = task_value(h.handle(&invoke(ME_FETCH_TASK, json!({}))).await.unwrap());
        let url = open["task"]["value"]["url"].as_str().unwrap();
        assert!(url.contains("/nominate-awards?telemetry=ikey&teamId="));
        assert!(!url.contains("awardId"));
    }

    #[tokio::test]
    async fn test_task_fetch_rejects_stale_cycle() {
        let repos = Repositories::in_memory();
        running_cycle(&repos).await;
        let connector = Arc::new(RecordingConnector::default());
        let response = handler(&repos, connector)
            .handle(&invoke(
                TASK_FETCH,
                json!({ "command": "NOMINATE", "RewardCycleId": "cycle-0", "AwardId": "a-1" }),
            ))
            .await
            .unwrap();
        let value = task_value(response);
        assert_eq!(value["task"]["value"]["title"], strings::NOMINATE_PEOPLE_TITLE);
        assert_eq!(
            value["task"]["value"]["card"]["content"]["body"][0]["text"],
            strings::CYCLE_CLOSED_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_configure_admin_skips_cycle_checks() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::default());
        let mut fetch = invoke(TASK_FETCH, json!({ "command": "configureadmin" }));
        if let Some(conversation) = fetch.conversation.as_mut() {
            conversation.id = format!("{TEAM};messageid=1588");
        }
        let value = task_value(handler(&repos, connector).handle(&fetch).await.unwrap());
        let url = value["task"]["value"]["url"].as_str().unwrap();
        assert!(url.contains("/config-admin-page?"));
        assert!(url.contains("isActivityIdPresent=true"));
    }

    #[tokio::test]
    async fn test_endorse_records_once() {
        let repos = Repositories::in_memory();
        running_cycle(&repos).await;
        let connector = Arc::new(RecordingConnector::with_roster(roster()));
        let h = handler(&repos, connector);
        let endorse = invoke(
            TASK_FETCH,
            json!({
                "command": "ENDORSE",
                "RewardCycleId": "cycle-1",
                "AwardId": "a-1",
                "AwardName": "Star",
                "NominatedToName": "riley",
                "NominatedToPrincipalName": "riley@contoso.com",
                "NominatedToObjectId": "oid-riley",
            }),
        );

        let first = task_value(h.handle(&endorse).await.unwrap());
        let second = task_value(h.handle(&endorse).await.unwrap());
        let text = |v: &Value| {
            v["task"]["value"]["card"]["content"]["body"][0]["columns"][1]["items"][0]["text"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert!(text(&first).starts_with("You endorsed riley for Star."));
        assert!(text(&second).contains("already endorsed"));

        let stored = repos
            .endorsements
            .list(TEAM, "cycle-1", Some("riley@contoso.com"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].endorsed_by_principal_name, "kim@contoso.com");
    }

    #[tokio::test]
    async fn test_save_nomination_posts_card_then_mentions_in_thread() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::with_roster(roster()));
        let response = handler(&repos, connector.clone())
            .handle(&invoke(
                TASK_SUBMIT,
                json!({
                    "command": "SAVENOMINATEDDETAILS",
                    "TeamId": TEAM,
                    "AwardName": "Star",
                    "AwardId": "a-1",
                    "NominatedToName": "riley",
                    "NominatedToPrincipalName": "riley@contoso.com",
                    "NominatedByName": "kim",
                    "RewardCycleId": "cycle-1",
                    "ReasonForNomination": "Great release",
                }),
            ))
            .await
            .unwrap();
        assert!(response.is_none());

        let sent = connector.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, TEAM);
        assert_eq!(sent[0].1.attachments[0].content["actions"][0]["data"]["command"], "ENDORSE");
        assert_eq!(sent[1].0, format!("{TEAM};messageid=activity-1"));
        assert_eq!(
            sent[1].1.text.as_deref(),
            Some("<at>riley</at> has been nominated by <at>kim</at>.")
        );
    }

    #[tokio::test]
    async fn test_nominate_submit_posts_award_carousel() {
        let repos = Repositories::in_memory();
        for id in ["a-1", "a-2", "a-3"] {
            repos
                .awards
                .upsert(AwardEntity {
                    team_id: TEAM.to_string(),
                    award_id: id.to_string(),
                    award_name: id.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let connector = Arc::new(RecordingConnector::default());
        handler(&repos, connector.clone())
            .handle(&invoke(
                TASK_SUBMIT,
                json!({
                    "command": "NOMINATE",
                    "TeamId": TEAM,
                    "RewardCycleId": "cycle-1",
                    "RewardCycleStartDate": "2024-05-01T00:00:00Z",
                    "RewardCycleEndDate": "2024-05-31T00:00:00Z",
                }),
            ))
            .await
            .unwrap();
        let sent = connector.sent();
        assert_eq!(sent[0].1.attachments.len(), 3);
    }

    #[tokio::test]
    async fn test_update_admin_edits_card_in_place() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::with_roster(roster()));
        let mut submit = invoke(
            TASK_SUBMIT,
            json!({
                "command": "UPDATEADMINDETAIL",
                "TeamId": TEAM,
                "AdminName": "riley",
                "AdminPrincipalName": "riley@contoso.com",
            }),
        );
        if let Some(conversation) = submit.conversation.as_mut() {
            conversation.id = format!("{TEAM};messageid=1588");
        }
        handler(&repos, connector.clone()).handle(&submit).await.unwrap();

        let calls = connector.calls();
        assert!(matches!(
            &calls[0],
            ConnectorCall::Update { activity_id, .. } if activity_id == "1588"
        ));
        let sent = connector.sent();
        assert_eq!(
            sent[0].1.text.as_deref(),
            Some("<at>riley</at> has been set as the Reward and Recognition admin by <at>kim</at>.")
        );
    }

    #[tokio::test]
    async fn test_tab_submit_with_pascal_case_command() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::with_roster(roster()));
        handler(&repos, connector.clone())
            .handle(&invoke(
                TASK_SUBMIT,
                json!({
                    "Command": "SAVEADMINDETAILS",
                    "TeamId": TEAM,
                    "AdminName": "riley",
                    "AdminPrincipalName": "riley@contoso.com",
                    "NoteForTeam": "Nominations close Friday",
                }),
            ))
            .await
            .unwrap();

        let sent = connector.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, TEAM);
        assert_eq!(sent[0].1.attachments.len(), 1);
        assert_eq!(sent[1].0, format!("{TEAM};messageid=activity-1"));
        assert_eq!(
            sent[1].1.text.as_deref(),
            Some("<at>riley</at> has been set as the Reward and Recognition admin by <at>kim</at>.")
        );
    }

    #[tokio::test]
    async fn test_extension_submit_with_pascal_case_command() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::with_roster(roster()));
        handler(&repos, connector.clone())
            .handle(&invoke(
                ME_SUBMIT_ACTION,
                json!({
                    "Command": "SaveNominatedDetails",
                    "TeamId": TEAM,
                    "AwardName": "Star",
                    "AwardId": "a-1",
                    "NominatedToName": "riley",
                    "NominatedToPrincipalName": "riley@contoso.com",
                    "NominatedByName": "kim",
                    "RewardCycleId": "cycle-1",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(connector.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_submit_reports_error_to_user() {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::default());
        let result = handler(&repos, connector.clone())
            .handle(&invoke(TASK_SUBMIT, json!({ "command": "NOMINATE", "TeamId": TEAM })))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        let sent = connector.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.text.as_deref(), Some(strings::ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_query_searches_current_cycle() {
        let repos = Repositories::in_memory();
        install(&repos).await;
        running_cycle(&repos).await;
        repos
            .nominations
            .store(crate::models::nomination::NominateEntity {
                team_id: TEAM.to_string(),
                award_name: "Star".to_string(),
                nominated_to_name: "Riley".to_string(),
                reward_cycle_id: "cycle-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let connector = Arc::new(RecordingConnector::default());
        let query = activity(json!({
            "type": "invoke",
            "name": ME_QUERY,
            "value": {
                "commandId": "search",
                "parameters": [{ "name": "searchText", "value": "ril" }],
                "queryOptions": { "skip": 0, "count": 10 },
            },
        }));
        let value = task_value(handler(&repos, connector).handle(&query).await.unwrap());
        let attachments = value["composeExtension"]["attachments"].as_array().unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0]["preview"]["content"]["title"], "Riley");
    }
}
