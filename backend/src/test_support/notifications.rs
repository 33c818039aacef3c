//! Shared test doubles for the notification dispatcher and scheduler.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::notifications::{DispatchResult, Notification, NotificationSleeper};
use crate::domain::ports::{MailDelivery, MailDeliveryError, NotificationSender, OutgoingMail};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> std::sync::MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex"),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl NotificationSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl NotificationSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

/// Mail adapter that accepts everything and keeps a copy.
#[derive(Default)]
pub struct RecordingMailDelivery(Mutex<Vec<OutgoingMail>>);

impl RecordingMailDelivery {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        lock(&self.0, "mail").clone()
    }
}

#[async_trait]
impl MailDelivery for RecordingMailDelivery {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailDeliveryError> {
        lock(&self.0, "mail").push(mail.clone());
        Ok(())
    }
}

/// Sender that records notifications and reports every recipient delivered.
#[derive(Default)]
pub struct RecordingNotificationSender(Mutex<Vec<Notification>>);

impl RecordingNotificationSender {
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.0, "sender").clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn dispatch(&self, notification: &Notification) -> DispatchResult {
        lock(&self.0, "sender").push(notification.clone());
        let delivered = notification.recipients().len();
        DispatchResult {
            ok: delivered > 0,
            delivered,
            recipients_failed: Vec::new(),
        }
    }
}
