//! Driving port for running a notification sweep on demand.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::domain::{Error, UserId};

/// Scheduled notification jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationJob {
    StockSweep,
    ReminderSweep,
    WeeklyDigest,
}

impl NotificationJob {
    pub const ALL: [NotificationJob; 3] = [
        NotificationJob::StockSweep,
        NotificationJob::ReminderSweep,
        NotificationJob::WeeklyDigest,
    ];

    /// Path segment and log label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockSweep => "stock-sweep",
            Self::ReminderSweep => "reminder-sweep",
            Self::WeeklyDigest => "weekly-digest",
        }
    }
}

impl fmt::Display for NotificationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationJob {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| Error::not_found(format!("unknown notification job: {s}")))
    }
}

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobReport {
    /// Intents produced by the sweep.
    pub intents: usize,
    /// Intents whose dispatch reached at least one recipient.
    pub delivered: usize,
    /// Intents with no successful recipient.
    pub failed: usize,
}

/// Domain use-case port for manual sweeps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationTrigger: Send + Sync {
    /// Run `job` immediately. Admin only.
    async fn run_job_now(&self, actor: &UserId, job: NotificationJob) -> Result<JobReport, Error>;
}
