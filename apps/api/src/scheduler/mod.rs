//! Cron-driven background loops.
//!
//! Each [`PeriodicTask`] owns one job and one schedule. It sleeps until the
//! next fire time, runs the job, and repeats until shutdown is signalled. A
//! job that is running when shutdown arrives is allowed to finish.

pub mod jobs;

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub use jobs::{CycleStatusJob, ReminderJob};

#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()>;
}

pub struct PeriodicTask {
    job: Arc<dyn ScheduledJob>,
    schedule: Schedule,
    executions: AtomicU64,
}

impl PeriodicTask {
    /// `expression` is a cron expression with a seconds field, evaluated in UTC.
    pub fn new(job: Arc<dyn ScheduledJob>, expression: &str) -> anyhow::Result<Self> {
        let schedule = Schedule::from_str(expression)
            .with_context(|| format!("Invalid schedule for {}: {expression}", job.name()))?;
        Ok(Self {
            job,
            schedule,
            executions: AtomicU64::new(0),
        })
    }

    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Fire time following a run that was due at `last_fire` and finished at
    /// `now`. Fire times that passed while the job ran are skipped.
    pub fn next_fire_after_run(
        &self,
        last_fire: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        self.next_fire(last_fire.max(now))
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let name = self.job.name();
        info!("{name} scheduled");
        let mut last_fire = Utc::now();

        loop {
            if *shutdown.borrow() {
                break;
            }
            let Some(next) = self.next_fire_after_run(last_fire, Utc::now()) else {
                warn!("{name} has no upcoming fire time");
                break;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => break,
            }
            last_fire = next;

            let count = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
            info!("{name} running. Execution count: {count}");
            if let Err(e) = self.job.run(Utc::now()).await {
                error!("{name} failed: {e:#}");
            }
        }

        info!("{name} stopped after {} executions", self.executions());
    }
}
