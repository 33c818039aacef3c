//! Port through which domain services hand notifications to the dispatcher.

use async_trait::async_trait;

use crate::domain::notifications::{DispatchResult, Notification};

/// Sends a notification to all of its recipients.
///
/// Implementations never fail: delivery problems are reported through the
/// returned [`DispatchResult`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> DispatchResult;
}

/// Sender that drops every notification. Used where delivery is not wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotificationSender;

#[async_trait]
impl NotificationSender for NoOpNotificationSender {
    async fn dispatch(&self, _notification: &Notification) -> DispatchResult {
        DispatchResult::skipped()
    }
}
