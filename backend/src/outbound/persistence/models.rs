//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Row-to-domain conversions re-run domain
//! validation and report corrupt rows as plain messages.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    BloodRequest, BloodRequestDraft, BloodRequestId, BloodStock, BloodType, DonationLocation,
    DonorNote, DonorRecord, DonorRecordDraft, DonorRecordId, EmailAddress, Justification,
    PasswordHash, PersonName, PhoneNumber, RequestQuantity, RequestStatus, User, UserDraft,
    UserId, UserRole,
};

use super::schema::{blood_requests, blood_stocks, donor_records, users};

fn corrupt(table: &str, detail: impl std::fmt::Display) -> String {
    format!("corrupt {table} row: {detail}")
}

fn quantity_from_db(table: &str, value: i32) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| corrupt(table, format!("negative quantity {value}")))
}

/// Convert a domain quantity into the `INTEGER` column range.
pub(crate) fn quantity_to_db(table: &str, value: u32) -> Result<i32, String> {
    i32::try_from(value)
        .map_err(|_| format!("{table} quantity {value} exceeds the column range"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: String,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let table = "users";
        let role: UserRole = self.role.parse().map_err(|err| corrupt(table, err))?;
        let blood_type = self
            .blood_type
            .as_deref()
            .map(str::parse::<BloodType>)
            .transpose()
            .map_err(|err| corrupt(table, err))?;
        let phone = self
            .phone
            .as_deref()
            .map(PhoneNumber::new)
            .transpose()
            .map_err(|err| corrupt(table, err))?;
        User::try_new(UserDraft {
            id: UserId::from_uuid(self.id),
            email: EmailAddress::new(&self.email).map_err(|err| corrupt(table, err))?,
            name: PersonName::new(&self.name).map_err(|err| corrupt(table, err))?,
            role,
            password_hash: PasswordHash::new(self.password_hash),
            blood_type,
            phone,
            address: self.address,
            registered_at: self.registered_at,
        })
        .map_err(|err| corrupt(table, err))
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub password_hash: &'a str,
    pub blood_type: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub registered_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            name: user.name().as_ref(),
            role: user.role().as_str(),
            password_hash: user.password_hash().as_str(),
            blood_type: user.blood_type().map(BloodType::as_str),
            phone: user.phone().map(<PhoneNumber as AsRef<str>>::as_ref),
            address: user.address(),
            registered_at: user.registered_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// Donor records
// ---------------------------------------------------------------------------

/// Row struct for reading from the donor_records table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = donor_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DonorRecordRow {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub donated_at: DateTime<Utc>,
    pub location: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DonorRecordRow {
    pub(crate) fn into_domain(self) -> Result<DonorRecord, String> {
        let table = "donor_records";
        Ok(DonorRecord::new(DonorRecordDraft {
            id: DonorRecordId::from_uuid(self.id),
            donor_id: UserId::from_uuid(self.donor_id),
            donated_at: self.donated_at,
            location: DonationLocation::new(&self.location).map_err(|err| corrupt(table, err))?,
            note: DonorNote::parse(self.note.as_deref()).map_err(|err| corrupt(table, err))?,
            created_at: self.created_at,
        }))
    }
}

/// Insertable struct for donor records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = donor_records)]
pub(crate) struct NewDonorRecordRow<'a> {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub donated_at: DateTime<Utc>,
    pub location: &'a str,
    pub note: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a DonorRecord> for NewDonorRecordRow<'a> {
    fn from(record: &'a DonorRecord) -> Self {
        Self {
            id: *record.id().as_uuid(),
            donor_id: *record.donor_id().as_uuid(),
            donated_at: record.donated_at(),
            location: record.location().as_ref(),
            note: record.note().map(<DonorNote as AsRef<str>>::as_ref),
            created_at: record.created_at(),
        }
    }
}

/// Changeset for rescheduling a donor record. `None` clears the note.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = donor_records)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DonorRecordUpdate<'a> {
    pub donated_at: DateTime<Utc>,
    pub location: &'a str,
    pub note: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Blood stocks
// ---------------------------------------------------------------------------

/// Row struct for the blood_stocks table; also used for inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = blood_stocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BloodStockRow {
    pub blood_type: String,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

impl BloodStockRow {
    pub(crate) fn into_domain(self) -> Result<BloodStock, String> {
        let table = "blood_stocks";
        let blood_type: BloodType = self.blood_type.parse().map_err(|err| corrupt(table, err))?;
        Ok(BloodStock::new(
            blood_type,
            quantity_from_db(table, self.quantity)?,
            self.updated_at,
        ))
    }
}

impl TryFrom<&BloodStock> for BloodStockRow {
    type Error = String;

    fn try_from(stock: &BloodStock) -> Result<Self, Self::Error> {
        Ok(Self {
            blood_type: stock.blood_type().as_str().to_owned(),
            quantity: quantity_to_db("blood_stocks", stock.quantity())?,
            updated_at: stock.updated_at(),
        })
    }
}

// ---------------------------------------------------------------------------
// Blood requests
// ---------------------------------------------------------------------------

/// Row struct for reading from the blood_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blood_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BloodRequestRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub blood_type: String,
    pub quantity: i32,
    pub justification: String,
    pub status: String,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BloodRequestRow {
    pub(crate) fn into_domain(self) -> Result<BloodRequest, String> {
        let table = "blood_requests";
        let quantity = RequestQuantity::new(quantity_from_db(table, self.quantity)?)
            .map_err(|err| corrupt(table, err))?;
        let status: RequestStatus = self.status.parse().map_err(|err| corrupt(table, err))?;
        Ok(BloodRequest::new(BloodRequestDraft {
            id: BloodRequestId::from_uuid(self.id),
            requester_id: UserId::from_uuid(self.requester_id),
            patient_name: PersonName::new(&self.patient_name).map_err(|err| corrupt(table, err))?,
            blood_type: self.blood_type.parse().map_err(|err| corrupt(table, err))?,
            quantity,
            justification: Justification::new(&self.justification)
                .map_err(|err| corrupt(table, err))?,
            status,
            admin_note: self.admin_note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Insertable struct for new blood requests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blood_requests)]
pub(crate) struct NewBloodRequestRow<'a> {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: &'a str,
    pub blood_type: &'a str,
    pub quantity: i32,
    pub justification: &'a str,
    pub status: &'a str,
    pub admin_note: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a BloodRequest> for NewBloodRequestRow<'a> {
    type Error = String;

    fn try_from(request: &'a BloodRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *request.id().as_uuid(),
            requester_id: *request.requester_id().as_uuid(),
            patient_name: request.patient_name().as_ref(),
            blood_type: request.blood_type().as_str(),
            quantity: quantity_to_db("blood_requests", request.quantity().get())?,
            justification: request.justification().as_ref(),
            status: request.status().as_str(),
            admin_note: request.admin_note(),
            created_at: request.created_at(),
            updated_at: request.updated_at(),
        })
    }
}

/// Changeset applied by a status transition.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = blood_requests)]
pub(crate) struct BloodRequestTransition<'a> {
    pub status: &'a str,
    pub admin_note: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a BloodRequest> for BloodRequestTransition<'a> {
    fn from(request: &'a BloodRequest) -> Self {
        Self {
            status: request.status().as_str(),
            admin_note: request.admin_note(),
            updated_at: request.updated_at(),
        }
    }
}
