//! Notification intents: what to say, independent of how it is rendered.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::{BloodType, EmailAddress, StockStatus};

/// Kind label used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    LowStock,
    Reminder,
    ThankYou,
    WeeklyDigest,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::Reminder => "reminder",
            Self::ThankYou => "thank_you",
            Self::WeeklyDigest => "weekly_digest",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregates reported in the Monday digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyDigestSummary {
    /// Day the digest is produced.
    pub report_date: NaiveDate,
    /// First day of the trailing seven-day window.
    pub period_start: NaiveDate,
    pub donations_last_week: usize,
    pub critical_stocks: usize,
    pub low_stocks: usize,
    pub upcoming_donations: usize,
}

/// Which notification to send, with the facts it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationIntent {
    /// A stock row is Low or Critical.
    LowStock {
        blood_type: BloodType,
        quantity: u32,
        status: StockStatus,
    },
    /// A donor has an appointment in `days_until` days.
    Reminder {
        donor_name: String,
        blood_type: Option<BloodType>,
        days_until: i64,
        date: NaiveDate,
        location: String,
    },
    /// A donation was recorded.
    ThankYou {
        donor_name: String,
        blood_type: Option<BloodType>,
        total_donations: usize,
    },
    /// Weekly statistics for admins.
    WeeklyDigest(WeeklyDigestSummary),
}

impl NotificationIntent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::LowStock { .. } => NotificationKind::LowStock,
            Self::Reminder { .. } => NotificationKind::Reminder,
            Self::ThankYou { .. } => NotificationKind::ThankYou,
            Self::WeeklyDigest(_) => NotificationKind::WeeklyDigest,
        }
    }
}

/// An intent addressed to its recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    intent: NotificationIntent,
    recipients: Vec<EmailAddress>,
}

impl Notification {
    pub fn new(intent: NotificationIntent, recipients: Vec<EmailAddress>) -> Self {
        Self { intent, recipients }
    }

    pub fn intent(&self) -> &NotificationIntent {
        &self.intent
    }

    pub fn recipients(&self) -> &[EmailAddress] {
        &self.recipients
    }
}

/// Subject and plain-text body of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Outcome of dispatching one notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchResult {
    /// At least one recipient accepted the message.
    pub ok: bool,
    /// Recipients that accepted the message.
    pub delivered: usize,
    /// Recipients whose send failed or timed out.
    pub recipients_failed: Vec<EmailAddress>,
}

impl DispatchResult {
    /// Result for a notification that was not sent at all.
    pub fn skipped() -> Self {
        Self::default()
    }
}
