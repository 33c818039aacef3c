//! Admin-only HTTP handlers: dashboards, user listings, and manual
//! notification sweeps.
//!
//! ```text
//! GET /api/v1/admin/dashboard
//! GET /api/v1/admin/statistics
//! GET /api/v1/admin/users
//! GET /api/v1/admin/donors
//! POST /api/v1/admin/notifications/{job}
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{AdminDashboard, JobReport, NotificationJob, SystemStatistics};
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts::UserResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Headline figures for the admin landing page.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardResponse {
    pub total_donors: usize,
    /// Blood types whose stock is `Kritis`.
    pub critical_stocks: usize,
    /// Donors outside their cooldown today.
    pub eligible_donors: usize,
}

impl From<AdminDashboard> for AdminDashboardResponse {
    fn from(value: AdminDashboard) -> Self {
        Self {
            total_donors: value.total_donors,
            critical_stocks: value.critical_stocks,
            eligible_donors: value.eligible_donors,
        }
    }
}

/// System-wide totals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub total_users: usize,
    pub total_donors: usize,
    pub total_requesters: usize,
    pub total_donations: u64,
    pub total_requests: usize,
    pub pending_requests: usize,
}

impl From<SystemStatistics> for StatisticsResponse {
    fn from(value: SystemStatistics) -> Self {
        Self {
            total_users: value.total_users,
            total_donors: value.total_donors,
            total_requesters: value.total_requesters,
            total_donations: value.total_donations,
            total_requests: value.total_requests,
            pending_requests: value.pending_requests,
        }
    }
}

/// Outcome of a manually triggered notification job.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobReportResponse {
    #[schema(example = "stock-sweep")]
    pub job: String,
    pub intents: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl JobReportResponse {
    fn new(job: NotificationJob, report: JobReport) -> Self {
        Self {
            job: job.to_string(),
            intents: report.intents,
            delivered: report.delivered,
            failed: report.failed,
        }
    }
}

/// Admin dashboard counters.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminDashboardResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminDashboard"
)]
#[get("/admin/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AdminDashboardResponse>> {
    let user_id = session.require_user_id()?;
    let summary = state.dashboard.admin_dashboard(&user_id).await?;
    Ok(web::Json(AdminDashboardResponse::from(summary)))
}

/// System statistics.
#[utoipa::path(
    get,
    path = "/api/v1/admin/statistics",
    responses(
        (status = 200, description = "Totals", body = StatisticsResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminStatistics"
)]
#[get("/admin/statistics")]
pub async fn statistics(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StatisticsResponse>> {
    let user_id = session.require_user_id()?;
    let totals = state.dashboard.statistics(&user_id).await?;
    Ok(web::Json(StatisticsResponse::from(totals)))
}

/// Every registered user.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "Users by registration date", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let user_id = session.require_user_id()?;
    let users = state.users.list_users(&user_id).await?;
    Ok(web::Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Registered donors only.
#[utoipa::path(
    get,
    path = "/api/v1/admin/donors",
    responses(
        (status = 200, description = "Donors by registration date", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listDonors"
)]
#[get("/admin/donors")]
pub async fn list_donors(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let user_id = session.require_user_id()?;
    let donors = state.users.list_donors(&user_id).await?;
    Ok(web::Json(donors.into_iter().map(UserResponse::from).collect()))
}

/// Run one notification job immediately.
///
/// Reminders already sent by a scheduled run may be sent again.
#[utoipa::path(
    post,
    path = "/api/v1/admin/notifications/{job}",
    params((
        "job" = String,
        Path,
        description = "`stock-sweep`, `reminder-sweep`, or `weekly-digest`"
    )),
    responses(
        (status = 200, description = "Job finished", body = JobReportResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown job", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "runNotificationJob"
)]
#[post("/admin/notifications/{job}")]
pub async fn run_notification_job(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<JobReportResponse>> {
    let user_id = session.require_user_id()?;
    let job: NotificationJob = path.into_inner().parse()?;
    let report = state.notifications.run_job_now(&user_id, job).await?;
    Ok(web::Json(JobReportResponse::new(job, report)))
}
