//! Driving port for donation history reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BloodType, DonorRecord, Error, UserId};

/// Summary shown to a donor after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorDashboard {
    pub name: String,
    pub blood_type: Option<BloodType>,
    /// Next eligible date as `D Bulan YYYY`, absent before the first donation.
    pub next_eligible_date: Option<String>,
    pub next_eligible_at: Option<DateTime<Utc>>,
    pub eligible_now: bool,
    pub total_donations: usize,
    /// Latest five entries formatted as `"<date> - <location>"`.
    pub recent_donations: Vec<String>,
}

/// Domain use-case port for donation reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationQuery: Send + Sync {
    /// Admins see every record, donors their own, requesters are refused.
    async fn list_records(&self, actor: &UserId) -> Result<Vec<DonorRecord>, Error>;

    /// Dashboard for the acting donor.
    async fn donor_dashboard(&self, actor: &UserId) -> Result<DonorDashboard, Error>;
}
