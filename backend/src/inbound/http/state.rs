//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountService, BloodRequestCommand, BloodRequestQuery, BloodStockCommand, BloodStockQuery,
    DashboardQuery, DonationCommand, DonationQuery, NotificationTrigger, UsersQuery,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use donor_backend::inbound::http::state::HttpState;
///
/// fn accounts_of(state: &HttpState) {
///     let _accounts = state.accounts.clone();
/// }
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub users: Arc<dyn UsersQuery>,
    pub stocks: Arc<dyn BloodStockCommand>,
    pub stocks_query: Arc<dyn BloodStockQuery>,
    pub donations: Arc<dyn DonationCommand>,
    pub donations_query: Arc<dyn DonationQuery>,
    pub requests: Arc<dyn BloodRequestCommand>,
    pub requests_query: Arc<dyn BloodRequestQuery>,
    pub dashboard: Arc<dyn DashboardQuery>,
    pub notifications: Arc<dyn NotificationTrigger>,
    /// Reference time for statuses derived at response time.
    pub clock: Arc<dyn Clock>,
}
