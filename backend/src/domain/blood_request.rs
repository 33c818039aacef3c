//! Blood requests and their approval state machine.
//!
//! ```text
//! Pending ──► Approved ──► Fulfilled
//!    │
//!    └──────► Rejected
//! ```
//!
//! `Rejected` and `Fulfilled` are terminal. Fulfilment also decrements the
//! matching stock row; the repository persists both changes together.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{BloodType, Error, PersonName, UserId};

/// Smallest number of bags a request may ask for.
pub const REQUEST_QUANTITY_MIN: u32 = 1;
/// Largest number of bags a request may ask for.
pub const REQUEST_QUANTITY_MAX: u32 = 10;
/// Minimum justification length.
pub const JUSTIFICATION_MIN: usize = 10;

/// Validation errors for blood request fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BloodRequestValidationError {
    #[error("quantity must be between {min} and {max} bags")]
    QuantityOutOfRange { min: u32, max: u32 },
    #[error("justification must be at least {min} characters")]
    JustificationTooShort { min: usize },
    #[error("unknown request status: {value}")]
    UnknownStatus { value: String },
}

/// Identifier of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloodRequestId(Uuid);

impl BloodRequestId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BloodRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Disetujui")]
    Approved,
    #[serde(rename = "Ditolak")]
    Rejected,
    #[serde(rename = "Selesai")]
    Fulfilled,
}

impl RequestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Disetujui",
            Self::Rejected => "Ditolak",
            Self::Fulfilled => "Selesai",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Fulfilled)
    }

    /// Whether `self → next` is an edge of the state machine.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Fulfilled)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = BloodRequestValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Disetujui" => Ok(Self::Approved),
            "Ditolak" => Ok(Self::Rejected),
            "Selesai" => Ok(Self::Fulfilled),
            other => Err(BloodRequestValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// Attempted transition that the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move blood request from {from} to {to}")]
pub struct IllegalTransition {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl From<IllegalTransition> for Error {
    fn from(value: IllegalTransition) -> Self {
        Error::conflict(value.to_string()).with_details(json!({
            "from": value.from.as_str(),
            "to": value.to.as_str(),
        }))
    }
}

/// Number of bags requested (1 to 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestQuantity(u32);

impl RequestQuantity {
    pub fn new(value: u32) -> Result<Self, BloodRequestValidationError> {
        if !(REQUEST_QUANTITY_MIN..=REQUEST_QUANTITY_MAX).contains(&value) {
            return Err(BloodRequestValidationError::QuantityOutOfRange {
                min: REQUEST_QUANTITY_MIN,
                max: REQUEST_QUANTITY_MAX,
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Clinical reason for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Justification(String);

impl Justification {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BloodRequestValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < JUSTIFICATION_MIN {
            return Err(BloodRequestValidationError::JustificationTooShort {
                min: JUSTIFICATION_MIN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Justification {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Input for [`BloodRequest::new`].
#[derive(Debug, Clone)]
pub struct BloodRequestDraft {
    pub id: BloodRequestId,
    pub requester_id: UserId,
    pub patient_name: PersonName,
    pub blood_type: BloodType,
    pub quantity: RequestQuantity,
    pub justification: Justification,
    pub status: RequestStatus,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for blood bags on behalf of a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodRequest {
    id: BloodRequestId,
    requester_id: UserId,
    patient_name: PersonName,
    blood_type: BloodType,
    quantity: RequestQuantity,
    justification: Justification,
    status: RequestStatus,
    admin_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BloodRequest {
    pub fn new(draft: BloodRequestDraft) -> Self {
        Self {
            id: draft.id,
            requester_id: draft.requester_id,
            patient_name: draft.patient_name,
            blood_type: draft.blood_type,
            quantity: draft.quantity,
            justification: draft.justification,
            status: draft.status,
            admin_note: draft.admin_note,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        }
    }

    pub fn id(&self) -> BloodRequestId {
        self.id
    }

    pub fn requester_id(&self) -> &UserId {
        &self.requester_id
    }

    pub fn patient_name(&self) -> &PersonName {
        &self.patient_name
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn quantity(&self) -> RequestQuantity {
        self.quantity
    }

    pub fn justification(&self) -> &Justification {
        &self.justification
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn admin_note(&self) -> Option<&str> {
        self.admin_note.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a transition, replacing the admin note when one is supplied.
    ///
    /// # Examples
    /// ```
    /// # use donor_backend::domain::*;
    /// # use chrono::Utc;
    /// # let now = Utc::now();
    /// # let request = BloodRequest::new(BloodRequestDraft {
    /// #     id: BloodRequestId::random(),
    /// #     requester_id: UserId::random(),
    /// #     patient_name: PersonName::new("John Doe").unwrap(),
    /// #     blood_type: BloodType::ONegative,
    /// #     quantity: RequestQuantity::new(5).unwrap(),
    /// #     justification: Justification::new("emergency surgery").unwrap(),
    /// #     status: RequestStatus::Pending,
    /// #     admin_note: None,
    /// #     created_at: now,
    /// #     updated_at: now,
    /// # });
    /// let rejected = request.transition(RequestStatus::Rejected, None, now).unwrap();
    /// assert!(rejected.transition(RequestStatus::Fulfilled, None, now).is_err());
    /// ```
    pub fn transition(
        &self,
        next: RequestStatus,
        admin_note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, IllegalTransition> {
        if !self.status.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        let admin_note = admin_note
            .map(|note| note.trim().to_owned())
            .filter(|note| !note.is_empty())
            .or_else(|| self.admin_note.clone());
        Ok(Self {
            status: next,
            admin_note,
            updated_at: now,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn pending() -> BloodRequest {
        let now = Utc::now();
        BloodRequest::new(BloodRequestDraft {
            id: BloodRequestId::random(),
            requester_id: UserId::random(),
            patient_name: PersonName::new("Maria Tan").expect("valid name"),
            blood_type: BloodType::ONegative,
            quantity: RequestQuantity::new(5).expect("valid quantity"),
            justification: Justification::new("scheduled caesarean section")
                .expect("valid justification"),
            status: RequestStatus::Pending,
            admin_note: Some("awaiting lab".to_owned()),
            created_at: now,
            updated_at: now,
        })
    }

    #[rstest]
    #[case(RequestStatus::Pending, RequestStatus::Approved, true)]
    #[case(RequestStatus::Pending, RequestStatus::Rejected, true)]
    #[case(RequestStatus::Approved, RequestStatus::Fulfilled, true)]
    #[case(RequestStatus::Pending, RequestStatus::Fulfilled, false)]
    #[case(RequestStatus::Approved, RequestStatus::Rejected, false)]
    #[case(RequestStatus::Rejected, RequestStatus::Fulfilled, false)]
    #[case(RequestStatus::Rejected, RequestStatus::Approved, false)]
    #[case(RequestStatus::Fulfilled, RequestStatus::Pending, false)]
    #[case(RequestStatus::Pending, RequestStatus::Pending, false)]
    fn transition_table(
        #[case] from: RequestStatus,
        #[case] to: RequestStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn approval_keeps_note_when_none_supplied(pending: BloodRequest) {
        let approved = pending
            .transition(RequestStatus::Approved, None, Utc::now())
            .expect("pending → approved");
        assert_eq!(approved.status(), RequestStatus::Approved);
        assert_eq!(approved.admin_note(), Some("awaiting lab"));
    }

    #[rstest]
    fn supplied_note_replaces_existing(pending: BloodRequest) {
        let rejected = pending
            .transition(
                RequestStatus::Rejected,
                Some("no matching donor".to_owned()),
                Utc::now(),
            )
            .expect("pending → rejected");
        assert_eq!(rejected.admin_note(), Some("no matching donor"));
        assert!(rejected.status().is_terminal());
    }

    #[rstest]
    fn illegal_transition_names_both_states(pending: BloodRequest) {
        let rejected = pending
            .transition(RequestStatus::Rejected, None, Utc::now())
            .expect("pending → rejected");
        let err = rejected
            .transition(RequestStatus::Fulfilled, None, Utc::now())
            .expect_err("terminal state");
        let message = err.to_string();
        assert!(message.contains("Ditolak"));
        assert!(message.contains("Selesai"));
        let domain: Error = err.into();
        assert_eq!(domain.code(), crate::domain::ErrorCode::Conflict);
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(10, true)]
    #[case(11, false)]
    fn quantity_bounds(#[case] value: u32, #[case] accepted: bool) {
        assert_eq!(RequestQuantity::new(value).is_ok(), accepted);
    }

    #[rstest]
    fn justification_needs_ten_characters() {
        assert!(Justification::new("too short").is_err());
        assert!(Justification::new("long enough").is_ok());
    }

    #[rstest]
    fn status_round_trips_wire_labels() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Fulfilled,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
    }
}
