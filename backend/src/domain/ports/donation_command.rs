//! Driving port for scheduling, rescheduling, and cancelling donations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{DonorRecord, DonorRecordId, Error, UserId};

/// Payload for a new donor record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDonationRequest {
    /// Target donor. Donors may omit it (or pass their own id); admins must set it.
    pub donor_id: Option<UserId>,
    pub donated_at: DateTime<Utc>,
    pub location: Option<String>,
    pub note: Option<String>,
}

/// Payload for changing an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleUpdate {
    pub donated_at: DateTime<Utc>,
    pub location: Option<String>,
    pub note: Option<String>,
}

/// Domain use-case port for donor record mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationCommand: Send + Sync {
    /// Self-schedule (donor) or record a donation for any donor (admin).
    async fn schedule(
        &self,
        actor: &UserId,
        request: ScheduleDonationRequest,
    ) -> Result<DonorRecord, Error>;

    /// Move a record. Owner or admin.
    async fn reschedule(
        &self,
        actor: &UserId,
        id: &DonorRecordId,
        update: ScheduleUpdate,
    ) -> Result<DonorRecord, Error>;

    /// Delete a future record. Owner or admin.
    async fn cancel(&self, actor: &UserId, id: &DonorRecordId) -> Result<(), Error>;
}
