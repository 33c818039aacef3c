//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

use crate::domain::notifications::DispatcherConfig;
use crate::inbound::http::session_config::SessionSettings;
use crate::outbound::persistence::DbPool;
use crate::settings::{ContentGeneratorSettings, MailRelaySettings};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) scheduler_enabled: bool,
    pub(crate) dispatcher: DispatcherConfig,
    pub(crate) content_generator: Option<ContentGeneratorSettings>,
    pub(crate) mail_relay: Option<MailRelaySettings>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from validated session settings.
    ///
    /// Storage defaults to in-memory, the scheduler is enabled, and
    /// notifications use fallback templates delivered to the log.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            key: session.key,
            cookie_secure: session.cookie_secure,
            same_site: session.same_site,
            bind_addr,
            db_pool: None,
            scheduler_enabled: true,
            dispatcher: DispatcherConfig::default(),
            content_generator: None,
            mail_relay: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, every repository port uses the Diesel adapters;
    /// otherwise one shared in-memory store backs them.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Enable or disable the background notification sweeps.
    #[must_use]
    pub fn with_scheduler_enabled(mut self, enabled: bool) -> Self {
        self.scheduler_enabled = enabled;
        self
    }

    /// Replace the dispatcher tuning.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Use the HTTP content generator when settings are present.
    #[must_use]
    pub fn with_content_generator(mut self, settings: Option<ContentGeneratorSettings>) -> Self {
        self.content_generator = settings;
        self
    }

    /// Use the HTTP mail relay when settings are present.
    #[must_use]
    pub fn with_mail_relay(mut self, settings: Option<MailRelaySettings>) -> Self {
        self.mail_relay = settings;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware; required when the `metrics` feature is
    /// enabled.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: PrometheusMetrics) -> Self {
        self.prometheus = Some(prometheus);
        self
    }
}
