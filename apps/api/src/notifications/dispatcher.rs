//! Proactive channel messages: nomination reminders and winner announcements.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{error, info};

use super::mentions::{mention_activity, split_addresses, MentionKind};
use super::retry::RetryPolicy;
use crate::bot::connector::{BotConnector, ConnectorError};
use crate::bot::schema::{
    Activity, ChannelAccount, ConversationParameters, ConversationResourceResponse,
    TeamsChannelData,
};
use crate::cards::nominate::nominate_carousel;
use crate::cards::winner::winner_carousel;
use crate::config::BotConfig;
use crate::models::nomination::AwardWinnerNotification;
use crate::models::reward_cycle::RewardCycleEntity;
use crate::models::team::TeamEntity;
use crate::storage::{Repositories, StorageError};
use crate::strings;

/// Reminders go out this many days before a cycle ends.
pub const REMINDER_LEAD_DAYS: i64 = 3;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("Team {0} has no installation record")]
    TeamNotInstalled(String),

    #[error("No winners to announce")]
    NoWinners,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    repos: Repositories,
    connector: Arc<dyn BotConnector>,
    bot: BotConfig,
    retry: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(
        repos: Repositories,
        connector: Arc<dyn BotConnector>,
        bot: BotConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repos,
            connector,
            bot,
            retry,
        }
    }

    /// Reminds every team whose active cycle ends exactly
    /// [`REMINDER_LEAD_DAYS`] after `now`. A failing team does not stop the
    /// others.
    pub async fn send_nomination_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReminderReport, NotifyError> {
        let due_day = now.date_naive() + Duration::days(REMINDER_LEAD_DAYS);
        let mut report = ReminderReport::default();

        for cycle in self.repos.reward_cycles.active_for_all_teams().await? {
            if cycle.end_day() != due_day {
                continue;
            }
            match self.send_reminder(&cycle).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    error!("Failed to send nomination reminder to team {}: {e}", cycle.team_id);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Nomination reminders: {} sent, {} failed",
            report.sent, report.failed
        );
        Ok(report)
    }

    /// Posts the award carousel as a new channel thread, then the reminder
    /// text inside that thread.
    pub async fn send_reminder(&self, cycle: &RewardCycleEntity) -> Result<(), NotifyError> {
        let team = self.installed_team(&cycle.team_id).await?;
        let awards = self.repos.awards.list(&cycle.team_id).await?;

        let carousel = Activity::carousel(nominate_carousel(
            &self.bot.app_base_uri,
            &awards,
            &cycle.cycle_id,
            cycle.reward_cycle_start_date,
            cycle.reward_cycle_end_date,
        ));
        info!("Sending nomination reminder to team {}", team.team_id);
        let created = self.start_thread(&team, carousel).await?;

        self.connector
            .send_to_conversation(
                &team.service_url,
                &created.id,
                &Activity::message(strings::NOMINATION_REMINDER_TEXT),
            )
            .await?;
        Ok(())
    }

    /// Announces winners in the team's channel and mentions each distinct
    /// winner in the announcement thread.
    pub async fn notify_winners(
        &self,
        winners: &[AwardWinnerNotification],
        actor_object_id: Option<&str>,
    ) -> Result<(), NotifyError> {
        let first = winners.first().ok_or(NotifyError::NoWinners)?;
        let team = self.installed_team(&first.team_id).await?;

        let carousel = Activity::carousel(winner_carousel(&self.bot.app_base_uri, winners));
        let created = self.start_thread(&team, carousel).await?;

        let mut seen = BTreeSet::new();
        let addresses: Vec<String> = winners
            .iter()
            .flat_map(|winner| split_addresses(&winner.nominated_to_principal_name))
            .filter(|address| seen.insert(address.to_lowercase()))
            .collect();

        let roster = self
            .connector
            .get_team_members(&team.service_url, &team.team_id)
            .await?;
        let mention = mention_activity(&roster, &addresses, actor_object_id, MentionKind::Winner);
        self.connector
            .send_to_conversation(&team.service_url, &created.id, &mention)
            .await?;

        info!(
            "Announced {} winners in team {}",
            addresses.len(),
            team.team_id
        );
        Ok(())
    }

    async fn installed_team(&self, team_id: &str) -> Result<TeamEntity, NotifyError> {
        self.repos
            .teams
            .get(team_id)
            .await?
            .ok_or_else(|| NotifyError::TeamNotInstalled(team_id.to_string()))
    }

    async fn start_thread(
        &self,
        team: &TeamEntity,
        activity: Activity,
    ) -> Result<ConversationResourceResponse, NotifyError> {
        let parameters = ConversationParameters {
            is_group: true,
            bot: ChannelAccount {
                id: self.bot.app_id.clone(),
                ..Default::default()
            },
            tenant_id: self.bot.tenant_id.clone(),
            activity,
            channel_data: TeamsChannelData::for_team(&team.team_id),
        };

        let connector = &self.connector;
        let service_url = team.service_url.as_str();
        let parameters = &parameters;
        let created = self
            .retry
            .run("create channel conversation", move || {
                connector.create_conversation(service_url, parameters)
            })
            .await?;
        Ok(created)
    }
}
