//! Domain primitives, rules, and services.
//!
//! Purpose: Define strongly typed entities for donors, blood stock, and
//! blood requests, the pure rules that govern them, and the services that
//! implement the driving ports. Nothing in here knows about HTTP, SQL, or
//! email transports; those live behind the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - rules: eligibility, calendar, capacity, and stock thresholds.
//! - BloodRequest / RequestStatus: the request lifecycle state machine.
//! - notifications: intent rendering and the email dispatcher.
//! - notification_scheduler: periodic sweeps that emit notification intents.

pub(crate) mod access;
pub mod auth;
pub mod blood;
pub mod blood_request;
pub mod date_format;
pub mod donor_record;
pub mod error;
pub mod notification_scheduler;
pub mod notifications;
pub mod ports;
pub mod rules;
pub mod stock;
pub mod trace_id;
pub mod user;

mod account_service;
mod blood_request_service;
mod blood_stock_service;
mod dashboard_service;
mod donation_service;
mod users_query_service;

pub use self::account_service::AccountServiceImpl;
pub use self::auth::{CredentialValidationError, LoginCredentials, PASSWORD_MIN_LENGTH, Password};
pub use self::blood::{BloodType, BloodTypeParseError};
pub use self::blood_request::{
    BloodRequest, BloodRequestDraft, BloodRequestId, BloodRequestValidationError,
    IllegalTransition, Justification, RequestQuantity, RequestStatus,
};
pub use self::blood_request_service::BloodRequestService;
pub use self::blood_stock_service::BloodStockService;
pub use self::dashboard_service::{DashboardRepositories, DashboardService};
pub use self::donation_service::DonationService;
pub use self::donor_record::{
    DonationLocation, DonorNote, DonorRecord, DonorRecordDraft, DonorRecordId,
    DonorRecordValidationError, DonorStatus,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::notification_scheduler::{
    NotificationScheduler, SchedulerConfig, SchedulerPorts, SchedulerState,
};
pub use self::stock::{BloodStock, StockStatus};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, PasswordHash, PersonName, PhoneNumber, User, UserDraft, UserId, UserRole,
    UserValidationError,
};
pub use self::users_query_service::UsersQueryService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use donor_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
