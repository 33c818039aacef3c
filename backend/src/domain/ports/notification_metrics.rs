//! Domain port surface for notification delivery counters.

use async_trait::async_trait;

use crate::domain::notifications::NotificationKind;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording notification metrics.
    pub enum NotificationMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } =>
            "notification metrics exporter failed: {message}",
    }
}

/// Outcome of one dispatch, recorded once per notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Intent kind that was dispatched.
    pub kind: NotificationKind,
    /// Whether the text came from the model rather than the fallback template.
    pub generated: bool,
    /// Recipients that accepted the message.
    pub delivered: usize,
    /// Recipients that failed or timed out.
    pub failed: usize,
}

/// Metrics recording port for notification dispatches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationMetrics: Send + Sync {
    /// Record the outcome of one dispatch.
    async fn record_dispatch(
        &self,
        outcome: &DispatchOutcome,
    ) -> Result<(), NotificationMetricsError>;
}

/// No-op implementation used when metrics are disabled or in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotificationMetrics;

#[async_trait]
impl NotificationMetrics for NoOpNotificationMetrics {
    async fn record_dispatch(
        &self,
        _outcome: &DispatchOutcome,
    ) -> Result<(), NotificationMetricsError> {
        Ok(())
    }
}
