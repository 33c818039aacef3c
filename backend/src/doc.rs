//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every handler in the inbound HTTP layer plus the health probes
//! - **Schemas**: request and response DTOs together with [`ErrorSchema`] and
//!   [`ErrorCodeSchema`], which describe the domain error payload without
//!   coupling domain types to utoipa
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::accounts::{LoginRequest, RegisterRequest, UserResponse};
use crate::inbound::http::admin::{AdminDashboardResponse, JobReportResponse, StatisticsResponse};
use crate::inbound::http::blood_requests::{
    BloodRequestResponse, SubmitBloodRequestPayload, TransitionPayload, TransitionResponse,
};
use crate::inbound::http::blood_stocks::{BloodStockResponse, StockUpdateRequest};
use crate::inbound::http::donor_records::{
    DonorDashboardResponse, DonorRecordResponse, RescheduleDonationPayload,
    ScheduleDonationPayload,
};
use crate::inbound::http::health::ServiceInfo;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Blood Donor Management System API",
        description = "Blood stock tracking, donation scheduling, blood requests, and notification sweeps for a hospital blood bank."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::blood_stocks::list_stocks,
        crate::inbound::http::blood_stocks::update_stock,
        crate::inbound::http::donor_records::list_records,
        crate::inbound::http::donor_records::schedule,
        crate::inbound::http::donor_records::reschedule,
        crate::inbound::http::donor_records::cancel,
        crate::inbound::http::donor_records::donor_dashboard,
        crate::inbound::http::blood_requests::list_requests,
        crate::inbound::http::blood_requests::submit,
        crate::inbound::http::blood_requests::transition,
        crate::inbound::http::admin::dashboard,
        crate::inbound::http::admin::statistics,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::list_donors,
        crate::inbound::http::admin::run_notification_job,
        crate::inbound::http::health::service_info,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        UserResponse,
        BloodStockResponse,
        StockUpdateRequest,
        DonorRecordResponse,
        ScheduleDonationPayload,
        RescheduleDonationPayload,
        DonorDashboardResponse,
        BloodRequestResponse,
        SubmitBloodRequestPayload,
        TransitionPayload,
        TransitionResponse,
        AdminDashboardResponse,
        StatisticsResponse,
        JobReportResponse,
        ServiceInfo,
        ErrorSchema,
        ErrorCodeSchema,
    )),
    tags(
        (name = "accounts", description = "Registration, login, and the current session"),
        (name = "blood-stocks", description = "Blood stock levels per blood type"),
        (name = "donations", description = "Donation scheduling and donor dashboards"),
        (name = "blood-requests", description = "Blood requests and their lifecycle"),
        (name = "admin", description = "Administrative dashboards and manual notification sweeps"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
