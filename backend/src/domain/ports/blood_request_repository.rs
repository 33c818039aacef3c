//! Port for blood requests, including the atomic fulfilment write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BloodRequest, BloodRequestId, BloodStock, RequestStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by blood request repository adapters.
    pub enum BloodRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "blood request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "blood request repository query failed: {message}",
        /// The request row disappeared before the write.
        Missing { id: String } => "blood request {id} not found",
        /// The stored status changed since it was read.
        StaleStatus { expected: String, found: String } =>
            "blood request status changed: expected {expected}, found {found}",
        /// Stock cannot cover the requested quantity.
        InsufficientStock { available: u32, requested: u32 } =>
            "insufficient stock: {available} available, {requested} requested",
    }
}

/// Port for reading and writing blood requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestRepository: Send + Sync {
    /// Persist a new request.
    async fn insert(&self, request: &BloodRequest) -> Result<(), BloodRequestRepositoryError>;

    /// Fetch one request.
    async fn find_by_id(
        &self,
        id: &BloodRequestId,
    ) -> Result<Option<BloodRequest>, BloodRequestRepositoryError>;

    /// Every request, newest first.
    async fn list_all(&self) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Requests submitted by one user, newest first.
    async fn list_for_requester(
        &self,
        requester_id: &UserId,
    ) -> Result<Vec<BloodRequest>, BloodRequestRepositoryError>;

    /// Persist a status change that does not touch stock.
    ///
    /// Fails with `StaleStatus` when the stored status is no longer
    /// `expected`.
    async fn save_transition(
        &self,
        request: &BloodRequest,
        expected: RequestStatus,
    ) -> Result<(), BloodRequestRepositoryError>;

    /// Mark an approved request fulfilled and decrement the stock row in one
    /// atomic step.
    ///
    /// A missing stock row is treated as the default quantity. On any error
    /// neither the request nor the stock changes. Returns the updated stock.
    async fn fulfil(
        &self,
        request: &BloodRequest,
        now: DateTime<Utc>,
    ) -> Result<BloodStock, BloodRequestRepositoryError>;
}
