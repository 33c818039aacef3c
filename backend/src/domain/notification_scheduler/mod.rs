//! Background scheduler for stock alerts, donation reminders, and the weekly
//! digest.
//!
//! One Tokio task waits for the next fire time and spawns each due job into a
//! `JoinSet` it owns, so jobs may overlap while a single job dispatches
//! sequentially.
//! Fire times are computed from local server time by [`next_fire`]. Manual
//! runs go through [`NotificationTrigger`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use mockable::Clock;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::domain::access::resolve_admin;
use crate::domain::notifications::{NotificationSleeper, TokioSleeper};
use crate::domain::ports::{
    BloodStockRepository, DonorRecordRepository, JobReport, NotificationJob, NotificationSender,
    NotificationTrigger, UserRepository,
};
use crate::domain::{Error, TraceId, UserId};

mod cadence;
mod jobs;

pub use cadence::{next_due, next_fire};

use jobs::JobRunner;

/// Scheduler tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Days ahead of a donation at which the donor is reminded.
    pub reminder_lead_days: Vec<u32>,
    /// Length of the digest's look-back and look-ahead windows.
    pub digest_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_lead_days: vec![3, 1],
            digest_window: Duration::days(7),
        }
    }
}

/// Repositories and the sender used by the sweeps.
pub struct SchedulerPorts {
    pub users: Arc<dyn UserRepository>,
    pub records: Arc<dyn DonorRecordRepository>,
    pub stocks: Arc<dyn BloodStockRepository>,
    pub sender: Arc<dyn NotificationSender>,
}

/// Lifecycle of a [`NotificationScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

enum Lifecycle {
    Idle,
    Running {
        cancel: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// Periodic notification sweeps with a guarded `Idle → Running → Stopped`
/// lifecycle.
pub struct NotificationScheduler {
    runner: Arc<JobRunner>,
    sleeper: Arc<dyn NotificationSleeper>,
    lifecycle: Mutex<Lifecycle>,
}

impl NotificationScheduler {
    /// Build a scheduler that sleeps on the Tokio timer.
    pub fn new(ports: SchedulerPorts, clock: Arc<dyn Clock>, config: SchedulerConfig) -> Self {
        Self::with_sleeper(ports, clock, Arc::new(TokioSleeper), config)
    }

    /// Build a scheduler with an injected sleeper.
    pub fn with_sleeper(
        ports: SchedulerPorts,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn NotificationSleeper>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            runner: Arc::new(JobRunner {
                ports,
                clock,
                config,
            }),
            sleeper,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        match self.lifecycle.lock().as_deref() {
            Ok(Lifecycle::Idle) => SchedulerState::Idle,
            Ok(Lifecycle::Running { .. }) => SchedulerState::Running,
            Ok(Lifecycle::Stopped) | Err(_) => SchedulerState::Stopped,
        }
    }

    /// Spawn the scheduling loop. Must be called inside a Tokio runtime.
    ///
    /// Fails with a conflict unless the scheduler is idle.
    pub fn start(&self) -> Result<(), Error> {
        let mut lifecycle = self
            .lifecycle
            .lock()
            .map_err(|_| Error::internal("scheduler state poisoned"))?;
        if !matches!(*lifecycle, Lifecycle::Idle) {
            return Err(Error::conflict("notification scheduler already started"));
        }
        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.runner),
            Arc::clone(&self.sleeper),
            cancelled,
        ));
        *lifecycle = Lifecycle::Running { cancel, handle };
        info!("notification scheduler started");
        Ok(())
    }

    /// Signal the loop to stop and wait for it to exit. The loop stops
    /// spawning jobs and waits for the ones in flight to finish before
    /// exiting. Safe to call repeatedly.
    pub async fn stop(&self) {
        let previous = match self.lifecycle.lock() {
            Ok(mut lifecycle) => std::mem::replace(&mut *lifecycle, Lifecycle::Stopped),
            Err(_) => return,
        };
        if let Lifecycle::Running { cancel, handle } = previous {
            let _ = cancel.send(true);
            if let Err(join_error) = handle.await {
                error!(%join_error, "notification scheduler loop ended abnormally");
            }
            info!("notification scheduler stopped");
        }
    }
}

fn spawn_job(jobs: &mut JoinSet<()>, runner: Arc<JobRunner>, job: NotificationJob) {
    jobs.spawn(TraceId::scope(TraceId::generate(), async move {
        match runner.run(job).await {
            Ok(report) => info!(
                %job,
                intents = report.intents,
                delivered = report.delivered,
                failed = report.failed,
                "notification job finished"
            ),
            Err(job_error) => error!(%job, error = %job_error, "notification job failed"),
        }
    }));
}

async fn run_loop(
    runner: Arc<JobRunner>,
    sleeper: Arc<dyn NotificationSleeper>,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut jobs = JoinSet::new();
    let mut last_fire: Option<NaiveDateTime> = None;
    loop {
        if *cancelled.borrow() {
            break;
        }
        while let Some(finished) = jobs.try_join_next() {
            log_abnormal_exit(finished);
        }
        let local_now = runner.clock.local().naive_local();
        let now = last_fire.map_or(local_now, |fired| fired.max(local_now));
        let (fire_at, due) = next_due(now);
        let wait = (fire_at - now).to_std().unwrap_or_default();
        debug!(?due, %fire_at, "waiting for next notification job");
        tokio::select! {
            biased;
            _ = cancelled.changed() => break,
            () = sleeper.sleep(wait) => {}
        }
        for job in due {
            spawn_job(&mut jobs, Arc::clone(&runner), job);
        }
        last_fire = Some(fire_at);
    }

    if !jobs.is_empty() {
        info!(in_flight = jobs.len(), "waiting for notification jobs to finish");
    }
    while let Some(finished) = jobs.join_next().await {
        log_abnormal_exit(finished);
    }
}

fn log_abnormal_exit(finished: Result<(), tokio::task::JoinError>) {
    if let Err(join_error) = finished {
        error!(%join_error, "notification job ended abnormally");
    }
}

#[async_trait]
impl NotificationTrigger for NotificationScheduler {
    async fn run_job_now(&self, actor: &UserId, job: NotificationJob) -> Result<JobReport, Error> {
        resolve_admin(self.runner.ports.users.as_ref(), actor).await?;
        info!(%job, %actor, "notification job triggered manually");
        self.runner.run(job).await
    }
}

#[cfg(test)]
mod tests;
