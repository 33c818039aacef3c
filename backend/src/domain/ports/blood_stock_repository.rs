//! Port for per-blood-type stock rows.

use async_trait::async_trait;

use crate::domain::{BloodStock, BloodType};

use super::define_port_error;

define_port_error! {
    /// Errors raised by blood stock repository adapters.
    pub enum BloodStockRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "blood stock repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "blood stock repository query failed: {message}",
    }
}

/// Port for reading and writing stock levels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodStockRepository: Send + Sync {
    /// Every stored row, in blood type order.
    async fn list(&self) -> Result<Vec<BloodStock>, BloodStockRepositoryError>;

    /// Row for one blood type.
    async fn find(
        &self,
        blood_type: BloodType,
    ) -> Result<Option<BloodStock>, BloodStockRepositoryError>;

    /// Insert `stock` unless a row for its blood type already exists.
    async fn insert_if_absent(&self, stock: &BloodStock) -> Result<(), BloodStockRepositoryError>;

    /// Insert or overwrite the row for `stock`'s blood type.
    async fn upsert(&self, stock: &BloodStock) -> Result<(), BloodStockRepositoryError>;
}
