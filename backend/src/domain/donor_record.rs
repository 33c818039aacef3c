//! Donation history entries and scheduled donations.
//!
//! A record with a future timestamp is a scheduled appointment; a record in
//! the past is a completed donation. Both count towards eligibility.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;
use super::rules::{DEFAULT_DONATION_LOCATION, eligibility_window};

/// Maximum length of a donor record note.
pub const DONOR_NOTE_MAX: usize = 500;

/// Validation errors for donor record fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DonorRecordValidationError {
    #[error("location must not be empty")]
    EmptyLocation,
    #[error("note must be at most {max} characters")]
    NoteTooLong { max: usize },
}

/// Identifier of a donor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonorRecordId(Uuid);

impl DonorRecordId {
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

impl fmt::Display for DonorRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Donor readiness relative to a record's cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonorStatus {
    #[serde(rename = "Siap Donor")]
    ReadyToDonate,
    #[serde(rename = "Masa Tunggu")]
    AwaitingWindow,
}

impl DonorStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadyToDonate => "Siap Donor",
            Self::AwaitingWindow => "Masa Tunggu",
        }
    }
}

/// Donation location, defaulting to the hospital.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationLocation(String);

impl DonationLocation {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DonorRecordValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DonorRecordValidationError::EmptyLocation);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Parse an optional location, falling back to the hospital.
    pub fn or_default(raw: Option<&str>) -> Result<Self, DonorRecordValidationError> {
        match raw {
            Some(value) => Self::new(value),
            None => Ok(Self::default()),
        }
    }
}

impl Default for DonationLocation {
    fn default() -> Self {
        Self(DEFAULT_DONATION_LOCATION.to_owned())
    }
}

impl AsRef<str> for DonationLocation {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Free-text note attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorNote(String);

impl DonorNote {
    /// Validate an optional note; blank notes become `None`.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, DonorRecordValidationError> {
        let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(None);
        };
        if value.chars().count() > DONOR_NOTE_MAX {
            return Err(DonorRecordValidationError::NoteTooLong {
                max: DONOR_NOTE_MAX,
            });
        }
        Ok(Some(Self(value.to_owned())))
    }
}

impl AsRef<str> for DonorNote {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Input for [`DonorRecord::new`].
#[derive(Debug, Clone)]
pub struct DonorRecordDraft {
    pub id: DonorRecordId,
    pub donor_id: UserId,
    pub donated_at: DateTime<Utc>,
    pub location: DonationLocation,
    pub note: Option<DonorNote>,
    pub created_at: DateTime<Utc>,
}

/// One donation, past or scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorRecord {
    id: DonorRecordId,
    donor_id: UserId,
    donated_at: DateTime<Utc>,
    location: DonationLocation,
    note: Option<DonorNote>,
    created_at: DateTime<Utc>,
}

impl DonorRecord {
    pub fn new(draft: DonorRecordDraft) -> Self {
        Self {
            id: draft.id,
            donor_id: draft.donor_id,
            donated_at: draft.donated_at,
            location: draft.location,
            note: draft.note,
            created_at: draft.created_at,
        }
    }

    pub fn id(&self) -> DonorRecordId {
        self.id
    }

    pub fn donor_id(&self) -> &UserId {
        &self.donor_id
    }

    /// Scheduled or actual donation time.
    pub fn donated_at(&self) -> DateTime<Utc> {
        self.donated_at
    }

    /// Calendar day of the donation.
    pub fn donation_day(&self) -> NaiveDate {
        self.donated_at.date_naive()
    }

    pub fn location(&self) -> &DonationLocation {
        &self.location
    }

    pub fn note(&self) -> Option<&DonorNote> {
        self.note.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the cooldown following this record ends.
    pub fn next_eligible_at(&self) -> DateTime<Utc> {
        self.donated_at + eligibility_window()
    }

    /// Status as of `now`. Never stored.
    pub fn status_at(&self, now: DateTime<Utc>) -> DonorStatus {
        if now >= self.next_eligible_at() {
            DonorStatus::ReadyToDonate
        } else {
            DonorStatus::AwaitingWindow
        }
    }

    /// Whether the record still lies ahead of `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.donated_at > now
    }

    /// Copy with a new time, location, and note.
    pub fn rescheduled(
        &self,
        donated_at: DateTime<Utc>,
        location: DonationLocation,
        note: Option<DonorNote>,
    ) -> Self {
        Self {
            donated_at,
            location,
            note,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn record() -> DonorRecord {
        let donated_at = Utc
            .with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        DonorRecord::new(DonorRecordDraft {
            id: DonorRecordId::random(),
            donor_id: UserId::random(),
            donated_at,
            location: DonationLocation::default(),
            note: None,
            created_at: donated_at,
        })
    }

    #[rstest]
    #[case(Duration::days(89), DonorStatus::AwaitingWindow)]
    #[case(Duration::days(90), DonorStatus::ReadyToDonate)]
    #[case(Duration::days(200), DonorStatus::ReadyToDonate)]
    fn status_is_derived_from_elapsed_time(
        record: DonorRecord,
        #[case] elapsed: Duration,
        #[case] expected: DonorStatus,
    ) {
        assert_eq!(record.status_at(record.donated_at() + elapsed), expected);
    }

    #[rstest]
    fn default_location_is_the_hospital() {
        assert_eq!(
            DonationLocation::or_default(None)
                .expect("default location")
                .as_ref(),
            DEFAULT_DONATION_LOCATION
        );
        assert_eq!(
            DonationLocation::new("   "),
            Err(DonorRecordValidationError::EmptyLocation)
        );
    }

    #[rstest]
    fn notes_are_trimmed_and_bounded() {
        assert_eq!(DonorNote::parse(Some("  ")), Ok(None));
        let long = "x".repeat(DONOR_NOTE_MAX + 1);
        assert_eq!(
            DonorNote::parse(Some(&long)),
            Err(DonorRecordValidationError::NoteTooLong {
                max: DONOR_NOTE_MAX
            })
        );
    }

    #[rstest]
    fn rescheduling_keeps_identity(record: DonorRecord) {
        let later = record.donated_at() + Duration::days(2);
        let moved = record.rescheduled(later, DonationLocation::default(), None);
        assert_eq!(moved.id(), record.id());
        assert_eq!(moved.donated_at(), later);
        assert_eq!(moved.created_at(), record.created_at());
    }

    #[rstest]
    fn status_serialises_to_wire_label() {
        let json = serde_json::to_string(&DonorStatus::AwaitingWindow).expect("serialise");
        assert_eq!(json, "\"Masa Tunggu\"");
    }
}
