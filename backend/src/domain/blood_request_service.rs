//! Blood request submission and moderation.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::access::{resolve_actor, resolve_admin};
use crate::domain::ports::{
    BloodRequestCommand, BloodRequestQuery, BloodRequestRepository, BloodRequestRepositoryError,
    SubmitBloodRequest, TransitionOutcome, TransitionRequest, UserRepository,
};
use crate::domain::rules::InsufficientStock;
use crate::domain::{
    BloodRequest, BloodRequestDraft, BloodRequestId, Error, Justification, PersonName,
    RequestQuantity, RequestStatus, UserId,
};

pub(crate) fn map_request_repository_error(error: BloodRequestRepositoryError) -> Error {
    match error {
        BloodRequestRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("blood request repository unavailable: {message}"))
        }
        BloodRequestRepositoryError::Query { message } => {
            Error::internal(format!("blood request repository error: {message}"))
        }
        BloodRequestRepositoryError::Missing { id } => {
            Error::not_found(format!("blood request {id} not found"))
        }
        BloodRequestRepositoryError::StaleStatus { expected, found } => {
            Error::conflict("blood request changed concurrently").with_details(json!({
                "code": "stale_status",
                "expected": expected,
                "found": found,
            }))
        }
        BloodRequestRepositoryError::InsufficientStock {
            available,
            requested,
        } => InsufficientStock {
            available,
            requested,
        }
        .into(),
    }
}

/// Blood request service implementing the command and query ports.
#[derive(Clone)]
pub struct BloodRequestService<U, B> {
    users: Arc<U>,
    requests: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<U, B> BloodRequestService<U, B> {
    pub fn new(users: Arc<U>, requests: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            requests,
            clock,
        }
    }
}

#[async_trait]
impl<U, B> BloodRequestCommand for BloodRequestService<U, B>
where
    U: UserRepository,
    B: BloodRequestRepository,
{
    async fn submit(
        &self,
        actor: &UserId,
        request: SubmitBloodRequest,
    ) -> Result<BloodRequest, Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        let patient_name = PersonName::new(&request.patient_name)
            .map_err(|err| Error::invalid_request(format!("patientName: {err}")))?;
        let quantity = RequestQuantity::new(request.quantity)
            .map_err(|err| Error::invalid_request(format!("quantity: {err}")))?;
        let justification = Justification::new(&request.justification)
            .map_err(|err| Error::invalid_request(format!("justification: {err}")))?;

        let now = self.clock.utc();
        let created = BloodRequest::new(BloodRequestDraft {
            id: BloodRequestId::random(),
            requester_id: *actor.id(),
            patient_name,
            blood_type: request.blood_type,
            quantity,
            justification,
            status: RequestStatus::Pending,
            admin_note: None,
            created_at: now,
            updated_at: now,
        });
        self.requests
            .insert(&created)
            .await
            .map_err(map_request_repository_error)?;
        info!(
            request_id = %created.id(),
            blood_type = %created.blood_type(),
            quantity = created.quantity().get(),
            "blood request submitted"
        );
        Ok(created)
    }

    async fn transition(
        &self,
        actor: &UserId,
        id: &BloodRequestId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, Error> {
        resolve_admin(self.users.as_ref(), actor).await?;
        let current = self
            .requests
            .find_by_id(id)
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| Error::not_found(format!("blood request {id} not found")))?;

        let now = self.clock.utc();
        let next = current.transition(request.status, request.admin_note, now)?;

        let stock = if next.status() == RequestStatus::Fulfilled {
            let stock = self
                .requests
                .fulfil(&next, now)
                .await
                .map_err(map_request_repository_error)?;
            info!(
                request_id = %next.id(),
                blood_type = %stock.blood_type(),
                remaining = stock.quantity(),
                status = %stock.status(),
                "blood request fulfilled"
            );
            Some(stock)
        } else {
            self.requests
                .save_transition(&next, current.status())
                .await
                .map_err(map_request_repository_error)?;
            info!(
                request_id = %next.id(),
                from = %current.status(),
                to = %next.status(),
                "blood request status changed"
            );
            None
        };

        Ok(TransitionOutcome {
            request: next,
            stock,
        })
    }
}

#[async_trait]
impl<U, B> BloodRequestQuery for BloodRequestService<U, B>
where
    U: UserRepository,
    B: BloodRequestRepository,
{
    async fn list_requests(&self, actor: &UserId) -> Result<Vec<BloodRequest>, Error> {
        let actor = resolve_actor(self.users.as_ref(), actor).await?;
        if actor.is_admin() {
            self.requests.list_all().await
        } else {
            self.requests.list_for_requester(actor.id()).await
        }
        .map_err(map_request_repository_error)
    }
}

#[cfg(test)]
#[path = "blood_request_service_tests.rs"]
mod tests;
