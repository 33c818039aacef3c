//! Prometheus adapter for notification dispatch metrics.
//!
//! Counters are registered with the registry that backs the `/metrics`
//! endpoint.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{DispatchOutcome, NotificationMetrics, NotificationMetricsError};

/// Prometheus-backed notification metrics recorder.
///
/// # Metric Specification
///
/// - `blood_bank_notifications_total{kind, source}`: one per dispatched
///   notification; `source` is `generated` or `template`.
/// - `blood_bank_notification_recipients_total{kind, outcome}`: recipients by
///   `delivered` or `failed`.
pub struct PrometheusNotificationMetrics {
    notifications_total: IntCounterVec,
    recipients_total: IntCounterVec,
}

impl PrometheusNotificationMetrics {
    /// Create and register both counters.
    ///
    /// # Errors
    ///
    /// Returns an error when a metric with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let notifications_total = IntCounterVec::new(
            Opts::new(
                "blood_bank_notifications_total",
                "Notifications dispatched by kind and content source",
            ),
            &["kind", "source"],
        )?;
        let recipients_total = IntCounterVec::new(
            Opts::new(
                "blood_bank_notification_recipients_total",
                "Notification recipients by kind and delivery outcome",
            ),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;
        registry.register(Box::new(recipients_total.clone()))?;
        Ok(Self {
            notifications_total,
            recipients_total,
        })
    }

    fn record(&self, outcome: &DispatchOutcome) {
        let kind = outcome.kind.as_str();
        let source = if outcome.generated {
            "generated"
        } else {
            "template"
        };
        self.notifications_total
            .with_label_values(&[kind, source])
            .inc();
        self.recipients_total
            .with_label_values(&[kind, "delivered"])
            .inc_by(outcome.delivered as u64);
        self.recipients_total
            .with_label_values(&[kind, "failed"])
            .inc_by(outcome.failed as u64);
    }
}

#[async_trait]
impl NotificationMetrics for PrometheusNotificationMetrics {
    async fn record_dispatch(
        &self,
        outcome: &DispatchOutcome,
    ) -> Result<(), NotificationMetricsError> {
        self.record(outcome);
        Ok(())
    }
}
