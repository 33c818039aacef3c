//! Donation schedule HTTP handlers.
//!
//! ```text
//! GET /api/v1/donor-records
//! POST /api/v1/donor-records {"donatedAt":"2025-04-07T09:00:00+08:00","location":"PMI Manado"}
//! PUT /api/v1/donor-records/{id} {"donatedAt":"2025-04-08T09:00:00+08:00"}
//! DELETE /api/v1/donor-records/{id}
//! GET /api/v1/donor/dashboard
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{DonorDashboard, ScheduleDonationRequest, ScheduleUpdate};
use crate::domain::{DonorRecord, DonorRecordId, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_rfc3339_timestamp, parse_uuid, require,
};

const DONOR_ID: FieldName = FieldName::new("donorId");
const DONATED_AT: FieldName = FieldName::new("donatedAt");
const RECORD_ID: FieldName = FieldName::new("id");

/// One scheduled or completed donation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorRecordResponse {
    pub id: String,
    pub donor_id: String,
    pub donated_at: String,
    #[schema(example = "RS Sentra Medika Minahasa Utara")]
    pub location: String,
    pub note: Option<String>,
    /// `Siap Donor` once the cooldown has passed, otherwise `Masa Tunggu`.
    #[schema(example = "Masa Tunggu")]
    pub status: String,
    pub created_at: String,
}

impl DonorRecordResponse {
    fn at(record: DonorRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id().to_string(),
            donor_id: record.donor_id().to_string(),
            donated_at: record.donated_at().to_rfc3339(),
            location: record.location().as_ref().to_owned(),
            note: record.note().map(|note| note.as_ref().to_owned()),
            status: record.status_at(now).as_str().to_owned(),
            created_at: record.created_at().to_rfc3339(),
        }
    }
}

/// Request payload for scheduling or recording a donation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDonationPayload {
    /// Admin only: the donor the record belongs to. Donors omit it.
    pub donor_id: Option<String>,
    #[schema(example = "2025-04-07T09:00:00+08:00")]
    pub donated_at: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
}

/// Request payload for moving a donation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleDonationPayload {
    #[schema(example = "2025-04-08T09:00:00+08:00")]
    pub donated_at: Option<String>,
    /// Omit to keep the current location.
    pub location: Option<String>,
    /// Omit to keep the current note.
    pub note: Option<String>,
}

/// Summary shown to a signed-in donor.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorDashboardResponse {
    pub name: String,
    #[schema(example = "O+")]
    pub blood_type: Option<String>,
    /// Localised date, for example `7 April 2025`.
    pub next_eligible_date: Option<String>,
    pub next_eligible_at: Option<String>,
    pub eligible_now: bool,
    pub total_donations: usize,
    /// Up to five `"<date> - <location>"` entries, newest first.
    pub recent_donations: Vec<String>,
}

impl From<DonorDashboard> for DonorDashboardResponse {
    fn from(value: DonorDashboard) -> Self {
        Self {
            name: value.name,
            blood_type: value.blood_type.map(|blood_type| blood_type.to_string()),
            next_eligible_date: value.next_eligible_date,
            next_eligible_at: value.next_eligible_at.map(|at| at.to_rfc3339()),
            eligible_now: value.eligible_now,
            total_donations: value.total_donations,
            recent_donations: value.recent_donations,
        }
    }
}

fn parse_record_id(raw: String) -> Result<DonorRecordId, Error> {
    parse_uuid(raw, RECORD_ID).map(DonorRecordId::from_uuid)
}

fn parse_schedule(payload: ScheduleDonationPayload) -> Result<ScheduleDonationRequest, Error> {
    let donor_id = payload
        .donor_id
        .map(|raw| parse_uuid(raw, DONOR_ID).map(UserId::from_uuid))
        .transpose()?;
    let donated_at = parse_rfc3339_timestamp(require(payload.donated_at, DONATED_AT)?, DONATED_AT)?;
    Ok(ScheduleDonationRequest {
        donor_id,
        donated_at,
        location: payload.location,
        note: payload.note,
    })
}

fn parse_update(payload: RescheduleDonationPayload) -> Result<ScheduleUpdate, Error> {
    let donated_at = parse_rfc3339_timestamp(require(payload.donated_at, DONATED_AT)?, DONATED_AT)?;
    Ok(ScheduleUpdate {
        donated_at,
        location: payload.location,
        note: payload.note,
    })
}

/// List donations visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/donor-records",
    description = "Admins see every record, donors their own.",
    responses(
        (status = 200, description = "Donations, newest first", body = [DonorRecordResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "listDonorRecords"
)]
#[get("/donor-records")]
pub async fn list_records(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<DonorRecordResponse>>> {
    let user_id = session.require_user_id()?;
    let records = state.donations_query.list_records(&user_id).await?;
    let now = state.clock.utc();
    Ok(web::Json(
        records
            .into_iter()
            .map(|record| DonorRecordResponse::at(record, now))
            .collect(),
    ))
}

/// Schedule a donation, or record one for a donor as an admin.
#[utoipa::path(
    post,
    path = "/api/v1/donor-records",
    request_body = ScheduleDonationPayload,
    responses(
        (status = 201, description = "Donation scheduled", body = DonorRecordResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Donor not found", body = ErrorSchema),
        (
            status = 422,
            description = "Date in the past, on a closed day, fully booked, or inside the cooldown",
            body = ErrorSchema
        ),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "scheduleDonation"
)]
#[post("/donor-records")]
pub async fn schedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ScheduleDonationPayload>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_schedule(payload.into_inner())?;
    let record = state.donations.schedule(&user_id, request).await?;
    Ok(HttpResponse::Created().json(DonorRecordResponse::at(record, state.clock.utc())))
}

/// Move a donation to a new date.
#[utoipa::path(
    put,
    path = "/api/v1/donor-records/{id}",
    params(("id" = String, Path, description = "Donor record identifier")),
    request_body = RescheduleDonationPayload,
    responses(
        (status = 200, description = "Donation moved", body = DonorRecordResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 422, description = "New date rejected", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "rescheduleDonation"
)]
#[put("/donor-records/{id}")]
pub async fn reschedule(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RescheduleDonationPayload>,
) -> ApiResult<web::Json<DonorRecordResponse>> {
    let user_id = session.require_user_id()?;
    let id = parse_record_id(path.into_inner())?;
    let update = parse_update(payload.into_inner())?;
    let record = state.donations.reschedule(&user_id, &id, update).await?;
    Ok(web::Json(DonorRecordResponse::at(record, state.clock.utc())))
}

/// Cancel an upcoming donation.
#[utoipa::path(
    delete,
    path = "/api/v1/donor-records/{id}",
    params(("id" = String, Path, description = "Donor record identifier")),
    responses(
        (status = 204, description = "Donation cancelled"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Donation already took place", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "cancelDonation"
)]
#[delete("/donor-records/{id}")]
pub async fn cancel(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = parse_record_id(path.into_inner())?;
    state.donations.cancel(&user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Eligibility and history summary for the signed-in donor.
#[utoipa::path(
    get,
    path = "/api/v1/donor/dashboard",
    responses(
        (status = 200, description = "Donor summary", body = DonorDashboardResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not a donor", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "donorDashboard"
)]
#[get("/donor/dashboard")]
pub async fn donor_dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DonorDashboardResponse>> {
    let user_id = session.require_user_id()?;
    let dashboard = state.donations_query.donor_dashboard(&user_id).await?;
    Ok(web::Json(DonorDashboardResponse::from(dashboard)))
}

#[cfg(test)]
mod tests;
