//! Blood request HTTP handlers.
//!
//! ```text
//! GET /api/v1/blood-requests
//! POST /api/v1/blood-requests {"patientName":"John Doe","bloodType":"O-","quantity":5,"justification":"emergency surgery"}
//! PUT /api/v1/admin/blood-requests/{id} {"status":"Disetujui","adminNote":"approved"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{SubmitBloodRequest, TransitionOutcome, TransitionRequest};
use crate::domain::{BloodRequest, BloodRequestId, BloodType, Error, RequestStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::blood_stocks::BloodStockResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_field, parse_uuid, require,
};

const PATIENT_NAME: FieldName = FieldName::new("patientName");
const BLOOD_TYPE: FieldName = FieldName::new("bloodType");
const QUANTITY: FieldName = FieldName::new("quantity");
const JUSTIFICATION: FieldName = FieldName::new("justification");
const STATUS: FieldName = FieldName::new("status");
const REQUEST_ID: FieldName = FieldName::new("id");

/// A blood request as seen by its requester or an admin.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequestResponse {
    pub id: String,
    pub requester_id: String,
    pub patient_name: String,
    #[schema(example = "O-")]
    pub blood_type: String,
    #[schema(example = 5)]
    pub quantity: u32,
    pub justification: String,
    /// `Pending`, `Disetujui`, `Ditolak`, or `Selesai`.
    #[schema(example = "Pending")]
    pub status: String,
    pub admin_note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BloodRequest> for BloodRequestResponse {
    fn from(request: BloodRequest) -> Self {
        Self {
            id: request.id().to_string(),
            requester_id: request.requester_id().to_string(),
            patient_name: request.patient_name().to_string(),
            blood_type: request.blood_type().to_string(),
            quantity: request.quantity().get(),
            justification: request.justification().as_ref().to_owned(),
            status: request.status().to_string(),
            admin_note: request.admin_note().map(str::to_owned),
            created_at: request.created_at().to_rfc3339(),
            updated_at: request.updated_at().to_rfc3339(),
        }
    }
}

/// Result of a status change. `stock` is present after fulfilment.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub request: BloodRequestResponse,
    pub stock: Option<BloodStockResponse>,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            request: BloodRequestResponse::from(outcome.request),
            stock: outcome.stock.map(BloodStockResponse::from),
        }
    }
}

/// Request payload for submitting a blood request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBloodRequestPayload {
    #[schema(example = "John Doe")]
    pub patient_name: Option<String>,
    #[schema(example = "O-")]
    pub blood_type: Option<String>,
    /// Units requested, 1 to 10.
    #[schema(example = 5)]
    pub quantity: Option<i64>,
    /// At least ten characters.
    #[schema(example = "emergency surgery")]
    pub justification: Option<String>,
}

/// Request payload for an admin status change.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    #[schema(example = "Disetujui")]
    pub status: Option<String>,
    pub admin_note: Option<String>,
}

fn parse_submission(payload: SubmitBloodRequestPayload) -> Result<SubmitBloodRequest, Error> {
    let patient_name = require(payload.patient_name, PATIENT_NAME)?;
    let blood_type: BloodType = parse_field(payload.blood_type, BLOOD_TYPE)?;
    let raw_quantity = require(payload.quantity, QUANTITY)?;
    let quantity = u32::try_from(raw_quantity).map_err(|_| {
        invalid_value_error(
            QUANTITY,
            &raw_quantity.to_string(),
            "quantity must be between 1 and 10",
        )
    })?;
    let justification = require(payload.justification, JUSTIFICATION)?;
    Ok(SubmitBloodRequest {
        patient_name,
        blood_type,
        quantity,
        justification,
    })
}

fn parse_transition(payload: TransitionPayload) -> Result<TransitionRequest, Error> {
    let status: RequestStatus = parse_field(payload.status, STATUS)?;
    Ok(TransitionRequest {
        status,
        admin_note: payload.admin_note,
    })
}

/// List requests visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/blood-requests",
    description = "Admins see every request, other users their own.",
    responses(
        (status = 200, description = "Requests, newest first", body = [BloodRequestResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["blood-requests"],
    operation_id = "listBloodRequests"
)]
#[get("/blood-requests")]
pub async fn list_requests(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BloodRequestResponse>>> {
    let user_id = session.require_user_id()?;
    let requests = state.requests_query.list_requests(&user_id).await?;
    Ok(web::Json(
        requests.into_iter().map(BloodRequestResponse::from).collect(),
    ))
}

/// Submit a new blood request in the `Pending` state.
#[utoipa::path(
    post,
    path = "/api/v1/blood-requests",
    request_body = SubmitBloodRequestPayload,
    responses(
        (status = 201, description = "Request submitted", body = BloodRequestResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["blood-requests"],
    operation_id = "submitBloodRequest"
)]
#[post("/blood-requests")]
pub async fn submit(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubmitBloodRequestPayload>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_submission(payload.into_inner())?;
    let created = state.requests.submit(&user_id, request).await?;
    Ok(HttpResponse::Created().json(BloodRequestResponse::from(created)))
}

/// Approve, reject, or fulfil a request.
///
/// Fulfilment decrements the matching stock in the same write as the status
/// change.
#[utoipa::path(
    put,
    path = "/api/v1/admin/blood-requests/{id}",
    params(("id" = String, Path, description = "Blood request identifier")),
    request_body = TransitionPayload,
    responses(
        (status = 200, description = "Status changed", body = TransitionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (
            status = 409,
            description = "Transition not allowed or not enough stock",
            body = ErrorSchema
        ),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["blood-requests"],
    operation_id = "transitionBloodRequest"
)]
#[put("/admin/blood-requests/{id}")]
pub async fn transition(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TransitionPayload>,
) -> ApiResult<web::Json<TransitionResponse>> {
    let user_id = session.require_user_id()?;
    let id = parse_uuid(path.into_inner(), REQUEST_ID).map(BloodRequestId::from_uuid)?;
    let request = parse_transition(payload.into_inner())?;
    let outcome = state.requests.transition(&user_id, &id, request).await?;
    Ok(web::Json(TransitionResponse::from(outcome)))
}
