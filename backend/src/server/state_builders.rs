//! Builders for HTTP state ports, the notification dispatcher, and the
//! scheduler.
//!
//! Services are generic over concrete repository types, so wiring happens in
//! [`wire_services`] once per storage backend: Diesel adapters when a pool is
//! configured, one shared [`InMemoryStore`] otherwise.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::notifications::{DispatcherPorts, NotificationDispatcher};
use crate::domain::ports::{
    BloodRequestRepository, BloodStockRepository, ContentGenerator, DisabledContentGenerator,
    DonorRecordRepository, MailDelivery, NotificationMetrics, UserRepository,
};
use crate::domain::{
    AccountServiceImpl, BloodRequestService, BloodStockService, DashboardRepositories,
    DashboardService, DonationService, EmailAddress, Error, NotificationScheduler,
    SchedulerConfig, SchedulerPorts, UsersQueryService,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::content::{HttpContentGenerator, HttpContentGeneratorConfig};
use crate::outbound::credentials::Argon2idHasher;
use crate::outbound::mail::{HttpMailRelay, HttpMailRelayConfig, LoggingMailDelivery, MailSender};
use crate::outbound::memory::InMemoryStore;
use crate::outbound::persistence::{
    DieselBloodRequestRepository, DieselBloodStockRepository, DieselDonorRecordRepository,
    DieselUserRepository,
};
use crate::settings::{ContentGeneratorSettings, MailRelaySettings};

use super::ServerConfig;

/// Repository adapters shared by the services and the scheduler.
pub(crate) struct Repositories<U, D, S, B> {
    pub users: Arc<U>,
    pub records: Arc<D>,
    pub stocks: Arc<S>,
    pub requests: Arc<B>,
}

/// Everything the server needs beyond its session configuration.
pub(crate) struct AppServices {
    pub http_state: HttpState,
    pub scheduler: Arc<NotificationScheduler>,
}

fn content_generator(
    settings: Option<&ContentGeneratorSettings>,
) -> std::io::Result<Arc<dyn ContentGenerator>> {
    let Some(settings) = settings else {
        info!("content generation disabled; notifications use fallback templates");
        return Ok(Arc::new(DisabledContentGenerator));
    };
    let generator = HttpContentGenerator::new(HttpContentGeneratorConfig {
        base_url: settings.base_url.clone(),
        model: settings.model.clone(),
        api_key: Zeroizing::new(settings.api_key.clone()),
        timeout: settings.timeout,
    })
    .map_err(|err| std::io::Error::other(format!("content generator setup failed: {err}")))?;
    info!(model = %settings.model, "content generation enabled");
    Ok(Arc::new(generator))
}

fn mail_delivery(settings: Option<&MailRelaySettings>) -> std::io::Result<Arc<dyn MailDelivery>> {
    let Some(settings) = settings else {
        warn!("no mail relay configured; notifications are logged only");
        return Ok(Arc::new(LoggingMailDelivery));
    };
    let address = EmailAddress::new(&settings.sender_address)
        .map_err(|err| std::io::Error::other(format!("invalid sender address: {err}")))?;
    let relay = HttpMailRelay::new(HttpMailRelayConfig {
        endpoint: settings.endpoint.clone(),
        token: Zeroizing::new(settings.token.clone()),
        sender: MailSender {
            name: settings.sender_name.clone(),
            address,
        },
        timeout: settings.timeout,
    })
    .map_err(|err| std::io::Error::other(format!("mail relay setup failed: {err}")))?;
    Ok(Arc::new(relay))
}

#[cfg(feature = "metrics")]
fn notification_metrics(
    config: &ServerConfig,
) -> std::io::Result<Option<Arc<dyn NotificationMetrics>>> {
    use crate::outbound::metrics::PrometheusNotificationMetrics;

    config
        .prometheus
        .as_ref()
        .map(|prometheus| {
            PrometheusNotificationMetrics::new(&prometheus.registry)
                .map(|metrics| Arc::new(metrics) as Arc<dyn NotificationMetrics>)
                .map_err(|err| {
                    std::io::Error::other(format!(
                        "notification metrics registration failed: {err}"
                    ))
                })
        })
        .transpose()
}

#[cfg(not(feature = "metrics"))]
fn notification_metrics(
    _config: &ServerConfig,
) -> std::io::Result<Option<Arc<dyn NotificationMetrics>>> {
    Ok(None)
}

/// Build the dispatcher from the configured generator, mail, and metrics
/// adapters.
///
/// # Errors
///
/// Returns [`std::io::Error`] when an HTTP adapter cannot be constructed or
/// metric registration fails.
pub(crate) fn build_dispatcher(
    config: &ServerConfig,
) -> std::io::Result<Arc<NotificationDispatcher>> {
    let mut ports = DispatcherPorts::new(
        content_generator(config.content_generator.as_ref())?,
        mail_delivery(config.mail_relay.as_ref())?,
    );
    if let Some(metrics) = notification_metrics(config)? {
        ports = ports.with_metrics(metrics);
    }
    Ok(Arc::new(NotificationDispatcher::new(
        ports,
        config.dispatcher.clone(),
    )))
}

/// Construct every driving-port service over one set of repositories and
/// make sure all eight stock rows exist.
///
/// # Errors
///
/// Returns the domain error raised while initialising stock rows.
pub(crate) async fn wire_services<U, D, S, B>(
    repos: Repositories<U, D, S, B>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
) -> Result<AppServices, Error>
where
    U: UserRepository + 'static,
    D: DonorRecordRepository + 'static,
    S: BloodStockRepository + 'static,
    B: BloodRequestRepository + 'static,
{
    let Repositories {
        users,
        records,
        stocks,
        requests,
    } = repos;

    let stock_service = Arc::new(BloodStockService::new(
        Arc::clone(&stocks),
        Arc::clone(&users),
        Arc::clone(&clock),
    ));
    let initialised = stock_service.ensure_all().await?;
    info!(rows = initialised.len(), "blood stock rows ready");

    let donations = Arc::new(DonationService::new(
        Arc::clone(&users),
        Arc::clone(&records),
        dispatcher.clone(),
        Arc::clone(&clock),
    ));
    let request_service = Arc::new(BloodRequestService::new(
        Arc::clone(&users),
        Arc::clone(&requests),
        Arc::clone(&clock),
    ));
    let scheduler = Arc::new(NotificationScheduler::new(
        SchedulerPorts {
            users: users.clone(),
            records: records.clone(),
            stocks: stocks.clone(),
            sender: dispatcher,
        },
        Arc::clone(&clock),
        SchedulerConfig::default(),
    ));

    let http_state = HttpState {
        accounts: Arc::new(AccountServiceImpl::new(
            Arc::clone(&users),
            Arc::new(Argon2idHasher::default()),
            Arc::clone(&clock),
        )),
        users: Arc::new(UsersQueryService::new(Arc::clone(&users))),
        stocks: stock_service.clone(),
        stocks_query: stock_service,
        donations: donations.clone(),
        donations_query: donations,
        requests: request_service.clone(),
        requests_query: request_service,
        dashboard: Arc::new(DashboardService::new(
            DashboardRepositories {
                users,
                records,
                stocks,
                requests,
            },
            Arc::clone(&clock),
        )),
        notifications: scheduler.clone(),
        clock,
    };

    Ok(AppServices {
        http_state,
        scheduler,
    })
}

/// Build services on the configured storage backend.
///
/// # Errors
///
/// Returns [`std::io::Error`] when adapter construction or stock
/// initialisation fails.
pub(crate) async fn build_app_services(config: &ServerConfig) -> std::io::Result<AppServices> {
    let dispatcher = build_dispatcher(config)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let services = match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL persistence");
            wire_services(
                Repositories {
                    users: Arc::new(DieselUserRepository::new(pool.clone())),
                    records: Arc::new(DieselDonorRecordRepository::new(pool.clone())),
                    stocks: Arc::new(DieselBloodStockRepository::new(pool.clone())),
                    requests: Arc::new(DieselBloodRequestRepository::new(pool.clone())),
                },
                dispatcher,
                clock,
            )
            .await
        }
        None => {
            warn!("no database configured; using in-memory storage");
            let store = Arc::new(InMemoryStore::new());
            wire_services(
                Repositories {
                    users: Arc::clone(&store),
                    records: Arc::clone(&store),
                    stocks: Arc::clone(&store),
                    requests: store,
                },
                dispatcher,
                clock,
            )
            .await
        }
    };

    services.map_err(|err| std::io::Error::other(format!("service wiring failed: {err}")))
}

#[cfg(test)]
mod tests {
    //! Wiring over the in-memory store.

    use super::*;
    use crate::domain::ports::{BloodStockQuery, NotificationJob, NotificationTrigger};
    use crate::domain::{BloodType, ErrorCode, SchedulerState, UserId};
    use crate::test_support::clock::MutableClock;
    use crate::test_support::fixtures::fixture_now;
    use actix_web::cookie::{Key, SameSite};
    use rstest::rstest;

    fn memory_repos() -> Repositories<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        Repositories {
            users: Arc::clone(&store),
            records: Arc::clone(&store),
            stocks: Arc::clone(&store),
            requests: store,
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig::new(
            crate::inbound::http::session_config::SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
            "127.0.0.1:0".parse().expect("socket address"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn wiring_initialises_every_stock_row() {
        let services = wire_services(
            memory_repos(),
            build_dispatcher(&test_config()).expect("dispatcher"),
            Arc::new(MutableClock::new(fixture_now())),
        )
        .await
        .expect("wiring");

        let stocks = services
            .http_state
            .stocks_query
            .list_stocks()
            .await
            .expect("stocks");

        assert_eq!(stocks.len(), BloodType::ALL.len());
        assert_eq!(services.scheduler.state(), SchedulerState::Idle);
    }

    #[rstest]
    #[tokio::test]
    async fn manual_trigger_requires_an_admin() {
        let services = wire_services(
            memory_repos(),
            build_dispatcher(&test_config()).expect("dispatcher"),
            Arc::new(MutableClock::new(fixture_now())),
        )
        .await
        .expect("wiring");

        let error = services
            .http_state
            .notifications
            .run_job_now(&UserId::random(), NotificationJob::StockSweep)
            .await
            .expect_err("unknown actor");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    fn unconfigured_adapters_fall_back_to_local_defaults() {
        assert!(content_generator(None).is_ok());
        assert!(mail_delivery(None).is_ok());
    }
}
