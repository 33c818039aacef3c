//! Port for donation history and scheduled donations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{DonorRecord, DonorRecordId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by donor record repository adapters.
    pub enum DonorRecordRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "donor record repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "donor record repository query failed: {message}",
    }
}

/// Port for reading and writing donor records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonorRecordRepository: Send + Sync {
    /// Persist a new record.
    async fn insert(&self, record: &DonorRecord) -> Result<(), DonorRecordRepositoryError>;

    /// Persist a new record unless its UTC day already holds `capacity`
    /// records. The count and the write are atomic; returns `false` and
    /// writes nothing when the day is full.
    async fn insert_within_capacity(
        &self,
        record: &DonorRecord,
        capacity: u32,
    ) -> Result<bool, DonorRecordRepositoryError>;

    /// Move an existing record unless its new UTC day already holds
    /// `capacity` other records. Atomic like
    /// [`insert_within_capacity`](Self::insert_within_capacity).
    async fn update_within_capacity(
        &self,
        record: &DonorRecord,
        capacity: u32,
    ) -> Result<bool, DonorRecordRepositoryError>;

    /// Overwrite the time, location, and note of an existing record.
    async fn update(&self, record: &DonorRecord) -> Result<(), DonorRecordRepositoryError>;

    /// Remove a record. Returns `false` when nothing was deleted.
    async fn delete(&self, id: &DonorRecordId) -> Result<bool, DonorRecordRepositoryError>;

    /// Fetch one record.
    async fn find_by_id(
        &self,
        id: &DonorRecordId,
    ) -> Result<Option<DonorRecord>, DonorRecordRepositoryError>;

    /// Every record, newest donation first.
    async fn list_all(&self) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError>;

    /// Records of one donor, newest donation first.
    async fn list_for_donor(
        &self,
        donor_id: &UserId,
    ) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError>;

    /// Records whose donation time lies in `[start, end)`, oldest first.
    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DonorRecord>, DonorRecordRepositoryError>;

    /// Total number of records.
    async fn count(&self) -> Result<u64, DonorRecordRepositoryError>;
}
