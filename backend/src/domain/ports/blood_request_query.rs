//! Driving port for blood request listings.

use async_trait::async_trait;

use crate::domain::{BloodRequest, Error, UserId};

/// Domain use-case port for blood request reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestQuery: Send + Sync {
    /// Admins see every request; other users see their own.
    async fn list_requests(&self, actor: &UserId) -> Result<Vec<BloodRequest>, Error>;
}
