//! Notification dispatcher.
//!
//! Turns a [`Notification`] into one email per recipient. Text comes from the
//! content generator when it answers with a usable `SUBJECT:`/`BODY:` reply,
//! otherwise from the deterministic fallback template. Sends run on a bounded
//! pool with a per-send timeout and a fixed gap between send starts. Delivery
//! is attempted once; nothing here returns an error.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::TraceId;
use crate::domain::ports::{
    ContentGenerator, ContentRequest, DispatchOutcome, MailDelivery, NoOpNotificationMetrics,
    NotificationMetrics, NotificationSender, OutgoingMail,
};

mod content;
mod intent;
mod templates;

pub use content::{parse_generated, prompt_for};
pub use intent::{
    DispatchResult, Notification, NotificationIntent, NotificationKind, RenderedMessage,
    WeeklyDigestSummary,
};
pub use templates::{fallback_message, html_document};

/// Dispatcher tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Sends allowed in flight at once.
    pub max_concurrent_sends: usize,
    /// Upper bound for one send attempt.
    pub send_timeout: Duration,
    /// Gap between successive send starts within one dispatch.
    pub send_spacing: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sends: 3,
            send_timeout: Duration::from_secs(10),
            send_spacing: Duration::from_secs(1),
        }
    }
}

/// Async sleeping abstraction so tests do not wait on the wall clock.
#[async_trait]
pub trait NotificationSleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl NotificationSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Outbound collaborators used by the dispatcher.
pub struct DispatcherPorts {
    pub generator: Arc<dyn ContentGenerator>,
    pub mail: Arc<dyn MailDelivery>,
    pub metrics: Arc<dyn NotificationMetrics>,
}

impl DispatcherPorts {
    /// Bundle the generator and mail adapters with no-op metrics.
    pub fn new(generator: Arc<dyn ContentGenerator>, mail: Arc<dyn MailDelivery>) -> Self {
        Self {
            generator,
            mail,
            metrics: Arc::new(NoOpNotificationMetrics),
        }
    }

    /// Replace the metrics recorder.
    pub fn with_metrics(mut self, metrics: Arc<dyn NotificationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Renders and delivers notifications.
pub struct NotificationDispatcher {
    generator: Arc<dyn ContentGenerator>,
    mail: Arc<dyn MailDelivery>,
    metrics: Arc<dyn NotificationMetrics>,
    sleeper: Arc<dyn NotificationSleeper>,
    send_permits: Arc<Semaphore>,
    config: DispatcherConfig,
}

impl NotificationDispatcher {
    /// Build a dispatcher that sleeps on the Tokio timer.
    pub fn new(ports: DispatcherPorts, config: DispatcherConfig) -> Self {
        Self::with_sleeper(ports, Arc::new(TokioSleeper), config)
    }

    /// Build a dispatcher with an injected sleeper.
    pub fn with_sleeper(
        ports: DispatcherPorts,
        sleeper: Arc<dyn NotificationSleeper>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            generator: ports.generator,
            mail: ports.mail,
            metrics: ports.metrics,
            sleeper,
            send_permits: Arc::new(Semaphore::new(config.max_concurrent_sends.max(1))),
            config,
        }
    }

    /// Produce the subject and body for `intent`.
    ///
    /// Returns the message and whether it came from the generator.
    pub async fn render(&self, intent: &NotificationIntent) -> (RenderedMessage, bool) {
        let Some(prompt) = prompt_for(intent) else {
            return (fallback_message(intent), false);
        };
        match self.generator.generate(&ContentRequest { prompt }).await {
            Ok(text) => match parse_generated(&text) {
                Some(message) => (message, true),
                None => {
                    warn!(kind = %intent.kind(), "generated content malformed; using template");
                    (fallback_message(intent), false)
                }
            },
            Err(error) => {
                debug!(kind = %intent.kind(), %error, "content generation failed; using template");
                (fallback_message(intent), false)
            }
        }
    }

    /// Render and deliver `notification` to each recipient.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchResult {
        let intent = notification.intent();
        let recipients = notification.recipients();
        if recipients.is_empty() {
            warn!(kind = %intent.kind(), "notification has no recipients");
            return DispatchResult::skipped();
        }

        let (message, generated) = self.render(intent).await;
        let html_body = html_document(&message.body);
        let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);

        let mut sends = JoinSet::new();
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                self.sleeper.sleep(self.config.send_spacing).await;
            }
            let Ok(permit) = Arc::clone(&self.send_permits).acquire_owned().await else {
                warn!("send pool closed; remaining recipients skipped");
                break;
            };
            let mail = OutgoingMail {
                to: recipient.clone(),
                subject: message.subject.clone(),
                text_body: message.body.clone(),
                html_body: html_body.clone(),
            };
            let delivery = Arc::clone(&self.mail);
            let timeout = self.config.send_timeout;
            sends.spawn(TraceId::scope(trace_id, async move {
                let _permit = permit;
                let outcome = tokio::time::timeout(timeout, delivery.send(&mail)).await;
                match outcome {
                    Ok(Ok(())) => Some(mail.to),
                    Ok(Err(error)) => {
                        warn!(recipient = %mail.to, %error, "mail delivery failed");
                        None
                    }
                    Err(_) => {
                        warn!(recipient = %mail.to, ?timeout, "mail delivery timed out");
                        None
                    }
                }
            }));
        }

        let mut succeeded = HashSet::new();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok(Some(address)) => {
                    succeeded.insert(address);
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "mail delivery task aborted"),
            }
        }

        let recipients_failed: Vec<_> = recipients
            .iter()
            .filter(|recipient| !succeeded.contains(*recipient))
            .cloned()
            .collect();
        let delivered = recipients.len() - recipients_failed.len();
        let result = DispatchResult {
            ok: delivered > 0,
            delivered,
            recipients_failed,
        };

        info!(
            kind = %intent.kind(),
            generated,
            delivered = result.delivered,
            failed = result.recipients_failed.len(),
            "notification dispatched"
        );
        // Metric export failures never affect delivery.
        let _ = self
            .metrics
            .record_dispatch(&DispatchOutcome {
                kind: intent.kind(),
                generated,
                delivered: result.delivered,
                failed: result.recipients_failed.len(),
            })
            .await;

        result
    }
}

#[async_trait]
impl NotificationSender for NotificationDispatcher {
    async fn dispatch(&self, notification: &Notification) -> DispatchResult {
        NotificationDispatcher::dispatch(self, notification).await
    }
}
