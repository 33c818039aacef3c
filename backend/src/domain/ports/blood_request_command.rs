//! Driving port for submitting and moderating blood requests.

use async_trait::async_trait;

use crate::domain::{
    BloodRequest, BloodRequestId, BloodStock, BloodType, Error, RequestStatus, UserId,
};

/// Payload for a new blood request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitBloodRequest {
    pub patient_name: String,
    pub blood_type: BloodType,
    pub quantity: u32,
    pub justification: String,
}

/// Admin decision on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub status: RequestStatus,
    pub admin_note: Option<String>,
}

/// Result of a transition. `stock` is set when the request was fulfilled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub request: BloodRequest,
    pub stock: Option<BloodStock>,
}

/// Domain use-case port for blood request mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestCommand: Send + Sync {
    /// Create a pending request on behalf of the actor.
    async fn submit(
        &self,
        actor: &UserId,
        request: SubmitBloodRequest,
    ) -> Result<BloodRequest, Error>;

    /// Move a request through the state machine. Admin only.
    async fn transition(
        &self,
        actor: &UserId,
        id: &BloodRequestId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, Error>;
}
