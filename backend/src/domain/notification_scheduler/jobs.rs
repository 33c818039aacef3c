//! The three sweeps: read a repository snapshot, build intents, dispatch.

use std::sync::Arc;

use chrono::{Duration, TimeDelta};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::access::map_user_repository_error;
use crate::domain::blood_stock_service::map_stock_repository_error;
use crate::domain::donation_service::map_record_repository_error;
use crate::domain::notifications::{Notification, NotificationIntent, WeeklyDigestSummary};
use crate::domain::ports::{JobReport, NotificationJob};
use crate::domain::rules::day_bounds;
use crate::domain::{EmailAddress, Error, StockStatus, UserRole};

use super::{SchedulerConfig, SchedulerPorts};

/// Executes sweeps against the scheduler's ports.
pub(super) struct JobRunner {
    pub(super) ports: SchedulerPorts,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) config: SchedulerConfig,
}

impl JobRunner {
    pub(super) async fn run(&self, job: NotificationJob) -> Result<JobReport, Error> {
        let notifications = match job {
            NotificationJob::StockSweep => self.stock_sweep().await?,
            NotificationJob::ReminderSweep => self.reminder_sweep().await?,
            NotificationJob::WeeklyDigest => self.weekly_digest().await?,
        };
        Ok(self.dispatch_all(job, notifications).await)
    }

    async fn dispatch_all(&self, job: NotificationJob, notifications: Vec<Notification>) -> JobReport {
        let mut report = JobReport {
            intents: notifications.len(),
            ..JobReport::default()
        };
        for notification in &notifications {
            let result = self.ports.sender.dispatch(notification).await;
            if result.ok {
                report.delivered += 1;
            } else {
                report.failed += 1;
                warn!(
                    %job,
                    kind = %notification.intent().kind(),
                    failed = result.recipients_failed.len(),
                    "notification not delivered"
                );
            }
        }
        report
    }

    async fn admin_emails(&self) -> Result<Vec<EmailAddress>, Error> {
        let admins = self
            .ports
            .users
            .list_by_role(UserRole::Admin)
            .await
            .map_err(map_user_repository_error)?;
        Ok(admins.into_iter().map(|admin| admin.email().clone()).collect())
    }

    async fn stock_sweep(&self) -> Result<Vec<Notification>, Error> {
        let stocks = self
            .ports
            .stocks
            .list()
            .await
            .map_err(map_stock_repository_error)?;
        let alerts: Vec<NotificationIntent> = stocks
            .iter()
            .filter(|stock| stock.status().needs_alert())
            .map(|stock| NotificationIntent::LowStock {
                blood_type: stock.blood_type(),
                quantity: stock.quantity(),
                status: stock.status(),
            })
            .collect();
        if alerts.is_empty() {
            return Ok(Vec::new());
        }
        let admins = self.admin_emails().await?;
        if admins.is_empty() {
            info!(alerts = alerts.len(), "no admins to alert; stock sweep skipped");
            return Ok(Vec::new());
        }
        Ok(alerts
            .into_iter()
            .map(|intent| Notification::new(intent, admins.clone()))
            .collect())
    }

    /// Collect reminders for every lead day. A failed lookup skips only the
    /// affected day or record.
    async fn reminder_sweep(&self) -> Result<Vec<Notification>, Error> {
        let today = self.clock.utc().date_naive();
        let mut notifications = Vec::new();
        for &lead in &self.config.reminder_lead_days {
            let day = today + Duration::days(i64::from(lead));
            let (start, end) = day_bounds(day);
            let records = match self.ports.records.list_between(start, end).await {
                Ok(records) => records,
                Err(error) => {
                    warn!(%day, error = %error, "reminder lookup failed; day skipped");
                    continue;
                }
            };
            for record in records {
                let donor = match self.ports.users.find_by_id(record.donor_id()).await {
                    Ok(Some(donor)) => donor,
                    Ok(None) => {
                        warn!(record_id = %record.id(), "reminder skipped; donor no longer exists");
                        continue;
                    }
                    Err(error) => {
                        warn!(
                            record_id = %record.id(),
                            error = %error,
                            "reminder skipped; donor lookup failed"
                        );
                        continue;
                    }
                };
                let intent = NotificationIntent::Reminder {
                    donor_name: donor.name().to_string(),
                    blood_type: donor.blood_type(),
                    days_until: i64::from(lead),
                    date: record.donation_day(),
                    location: record.location().as_ref().to_owned(),
                };
                notifications.push(Notification::new(intent, vec![donor.email().clone()]));
            }
        }
        Ok(notifications)
    }

    async fn weekly_digest(&self) -> Result<Vec<Notification>, Error> {
        let now = self.clock.utc();
        let window = self.config.digest_window;
        let past = self
            .ports
            .records
            .list_between(now - window, now)
            .await
            .map_err(map_record_repository_error)?;
        let upcoming = self
            .ports
            .records
            .list_between(now, now + window + TimeDelta::seconds(1))
            .await
            .map_err(map_record_repository_error)?;
        let stocks = self
            .ports
            .stocks
            .list()
            .await
            .map_err(map_stock_repository_error)?;
        let count_status = |status: StockStatus| {
            stocks
                .iter()
                .filter(|stock| stock.status() == status)
                .count()
        };
        let summary = WeeklyDigestSummary {
            report_date: now.date_naive(),
            period_start: (now - window).date_naive(),
            donations_last_week: past.len(),
            critical_stocks: count_status(StockStatus::Critical),
            low_stocks: count_status(StockStatus::Low),
            upcoming_donations: upcoming.len(),
        };
        let admins = self.admin_emails().await?;
        if admins.is_empty() {
            info!("no admins to receive the weekly digest; skipped");
            return Ok(Vec::new());
        }
        Ok(vec![Notification::new(
            NotificationIntent::WeeklyDigest(summary),
            admins,
        )])
    }
}
