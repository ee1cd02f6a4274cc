use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::ScheduledJob;
use crate::notifications::NotificationDispatcher;
use crate::reward_cycles::lifecycle::check_or_update_cycle_status;
use crate::reward_cycles::RewardCycleStore;

/// Opens and closes reward cycles as their date windows start and end.
pub struct CycleStatusJob {
    cycles: RewardCycleStore,
}

impl CycleStatusJob {
    pub fn new(cycles: RewardCycleStore) -> Self {
        Self { cycles }
    }
}

#[async_trait]
impl ScheduledJob for CycleStatusJob {
    fn name(&self) -> &'static str {
        "RewardCycleStatusCheck"
    }

    async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let report = check_or_update_cycle_status(&self.cycles, now).await?;
        info!(
            "Reward cycle status check: {} activated, {} closed",
            report.activated, report.closed
        );
        Ok(())
    }
}

/// Posts the nomination reminder to teams whose cycle ends soon.
pub struct ReminderJob {
    notifier: NotificationDispatcher,
}

impl ReminderJob {
    pub fn new(notifier: NotificationDispatcher) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ScheduledJob for ReminderJob {
    fn name(&self) -> &'static str {
        "NominationReminder"
    }

    async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let report = self.notifier.send_nomination_reminders(now).await?;
        info!(
            "Nomination reminders: {} sent, {} failed",
            report.sent, report.failed
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reward_cycle::RewardCycleState;
    use crate::reward_cycles::storage::tests::cycle;
    use crate::storage::Repositories;
    use chrono::Duration;

    #[tokio::test]
    async fn test_cycle_status_job_closes_expired_cycles() {
        let repos = Repositories::in_memory();
        let now = Utc::now();
        repos
            .reward_cycles
            .upsert(cycle(
                "team-1",
                "cycle-1",
                now - Duration::days(10),
                now - Duration::days(1),
                RewardCycleState::Active,
            ))
            .await
            .unwrap();

        CycleStatusJob::new(repos.reward_cycles.clone())
            .run(now)
            .await
            .unwrap();

        let stored = repos.reward_cycles.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].reward_cycle_state, RewardCycleState::InActive);
    }
}
