//! Driving port for reading stock levels.

use async_trait::async_trait;

use crate::domain::{BloodStock, Error};

/// Domain use-case port for listing stock levels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodStockQuery: Send + Sync {
    /// One row per blood type, initialising any missing row first.
    async fn list_stocks(&self) -> Result<Vec<BloodStock>, Error>;
}
