//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};

use crate::domain::ports::{
    MockAccountService, MockBloodRequestCommand, MockBloodRequestQuery, MockBloodStockCommand,
    MockBloodStockQuery, MockDashboardQuery, MockDonationCommand, MockDonationQuery,
    MockNotificationTrigger, MockUsersQuery,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::test_support::clock::MutableClock;
use crate::test_support::fixtures::fixture_now;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// One mock per driving port. Unconfigured mocks panic when called, so each
/// test only sets expectations on the ports its handler should touch.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountService,
    pub users: MockUsersQuery,
    pub stocks: MockBloodStockCommand,
    pub stocks_query: MockBloodStockQuery,
    pub donations: MockDonationCommand,
    pub donations_query: MockDonationQuery,
    pub requests: MockBloodRequestCommand,
    pub requests_query: MockBloodRequestQuery,
    pub dashboard: MockDashboardQuery,
    pub notifications: MockNotificationTrigger,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            accounts: Arc::new(self.accounts),
            users: Arc::new(self.users),
            stocks: Arc::new(self.stocks),
            stocks_query: Arc::new(self.stocks_query),
            donations: Arc::new(self.donations),
            donations_query: Arc::new(self.donations_query),
            requests: Arc::new(self.requests),
            requests_query: Arc::new(self.requests_query),
            dashboard: Arc::new(self.dashboard),
            notifications: Arc::new(self.notifications),
            clock: Arc::new(MutableClock::new(fixture_now())),
        })
    }
}

/// Path of the test-only route that signs a user in without credentials.
pub const TEST_LOGIN_PATH: &str = "/test/session/{id}";

/// Test-only handler persisting the user id from the path in the session.
pub async fn test_login(
    session: SessionContext,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(path.into_inner())
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Sign `user_id` in through [`test_login`] and return the session cookie.
pub async fn session_cookie<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(&format!("/test/session/{user_id}"))
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "test login failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Read a JSON error payload and return its `code` field.
pub async fn error_code(res: ServiceResponse) -> String {
    let body: serde_json::Value = test::read_body_json(res).await;
    body.get("code")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
