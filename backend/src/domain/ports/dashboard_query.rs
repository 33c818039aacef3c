//! Driving port for admin dashboards and statistics.

use async_trait::async_trait;

use crate::domain::{Error, UserId};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminDashboard {
    pub total_donors: usize,
    pub critical_stocks: usize,
    /// Donors whose cooldown has ended (or who never donated).
    pub eligible_donors: usize,
}

/// System-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemStatistics {
    pub total_users: usize,
    pub total_donors: usize,
    pub total_requesters: usize,
    pub total_donations: u64,
    pub total_requests: usize,
    pub pending_requests: usize,
}

/// Domain use-case port for admin read models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    async fn admin_dashboard(&self, actor: &UserId) -> Result<AdminDashboard, Error>;

    async fn statistics(&self, actor: &UserId) -> Result<SystemStatistics, Error>;
}
