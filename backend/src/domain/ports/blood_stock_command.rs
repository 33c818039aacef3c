//! Driving port for stock adjustments.

use async_trait::async_trait;

use crate::domain::{BloodStock, BloodType, Error, UserId};

/// Domain use-case port for changing stock levels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodStockCommand: Send + Sync {
    /// Set the bag count for one blood type. Admin only.
    async fn update_quantity(
        &self,
        actor: &UserId,
        blood_type: BloodType,
        quantity: u32,
    ) -> Result<BloodStock, Error>;
}
