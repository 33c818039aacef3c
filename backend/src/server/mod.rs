//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::{AppServices, build_app_services};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{error, info};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::NotificationScheduler;
use crate::inbound::http::accounts::{current_user, login, logout, register};
use crate::inbound::http::admin::{
    dashboard, list_donors, list_users, run_notification_job, statistics,
};
use crate::inbound::http::blood_requests::{list_requests, submit, transition};
use crate::inbound::http::blood_stocks::{list_stocks, update_stock};
use crate::inbound::http::donor_records::{
    cancel, donor_dashboard, list_records, reschedule, schedule,
};
use crate::inbound::http::health::{HealthState, live, ready, service_info};
use crate::inbound::http::state::HttpState;

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(actix_web::cookie::time::Duration::hours(SESSION_TTL_HOURS)),
        )
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .service(register)
        .service(login)
        .service(logout)
        .service(current_user)
        .service(list_stocks)
        .service(update_stock)
        .service(list_records)
        .service(schedule)
        .service(reschedule)
        .service(cancel)
        .service(donor_dashboard)
        .service(list_requests)
        .service(submit)
        .service(transition)
        .service(dashboard)
        .service(statistics)
        .service(list_users)
        .service(list_donors)
        .service(run_notification_job);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(service_info)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// A bound HTTP server together with the notification scheduler it owns.
pub struct RunningServer {
    server: Server,
    scheduler: Arc<NotificationScheduler>,
    health_state: web::Data<HealthState>,
}

impl RunningServer {
    /// Drive the listener until shutdown, then stop the scheduler.
    ///
    /// # Errors
    ///
    /// Propagates the I/O error that ended the server.
    pub async fn run(self) -> std::io::Result<()> {
        let result = self.server.await;
        self.health_state.mark_unhealthy();
        self.scheduler.stop().await;
        result
    }
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration, and start the notification scheduler when enabled.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing session, storage,
///   notification, and optional metrics settings.
///
/// # Returns
/// A [`RunningServer`] that must be run to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when adapter construction, binding the
/// socket, or starting the scheduler fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<RunningServer> {
    let AppServices {
        http_state,
        scheduler,
    } = build_app_services(&config).await?;
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        scheduler_enabled,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let prometheus = prometheus.ok_or_else(|| {
        std::io::Error::other("metrics feature enabled without Prometheus middleware")
    })?;

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    if scheduler_enabled {
        scheduler.start().map_err(|err| {
            error!(error = %err, "notification scheduler failed to start");
            std::io::Error::other(format!("notification scheduler failed to start: {err}"))
        })?;
    } else {
        info!("notification scheduler disabled");
    }

    health_state.mark_ready();
    info!(%bind_addr, "server listening");
    Ok(RunningServer {
        server,
        scheduler,
        health_state,
    })
}

#[cfg(test)]
mod tests {
    //! End-to-end routing over the in-memory store.

    use super::*;
    use crate::inbound::http::session_config::SessionSettings;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    async fn deps() -> AppDependencies {
        let config = ServerConfig::new(
            SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
            "127.0.0.1:0".parse().expect("socket address"),
        );
        let services = build_app_services(&config).await.expect("services");
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(services.http_state),
            key: config.key.clone(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    #[actix_web::test]
    async fn public_endpoints_are_routed() {
        let app = test::init_service(build_app(deps().await)).await;

        let info = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(info.status(), StatusCode::OK);

        let stocks: Vec<Value> = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/blood-stocks")
                .to_request(),
        )
        .await;
        assert_eq!(stocks.len(), 8);
        assert!(stocks.iter().all(|stock| stock["status"] == "Kritis"));
    }

    #[actix_web::test]
    async fn registered_admin_can_update_stock() {
        let app = test::init_service(build_app(deps().await)).await;

        let register_req = test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(json!({
                "email": "admin@hospital.com",
                "name": "Administrator",
                "password": "admin123",
                "role": "admin"
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, register_req).await.status(),
            StatusCode::CREATED
        );

        let login_req = test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "admin@hospital.com", "password": "admin123" }))
            .to_request();
        let login_res = test::call_service(&app, login_req).await;
        assert_eq!(login_res.status(), StatusCode::OK);
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let update = test::TestRequest::put()
            .uri("/api/v1/admin/blood-stocks/O-")
            .cookie(cookie)
            .set_json(json!({ "quantity": 30 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, update).await;

        assert_eq!(body["quantity"], 30);
        assert_eq!(body["status"], "Aman");
    }

    #[actix_web::test]
    async fn responses_carry_trace_ids() {
        let app = test::init_service(build_app(deps().await)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/me").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().contains_key(crate::domain::TRACE_ID_HEADER));
    }
}
