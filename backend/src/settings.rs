//! Application configuration loaded via OrthoConfig.
//!
//! Values come from `BLOOD_BANK_*` environment variables, configuration
//! files, and command-line flags. Accessors apply defaults and validate
//! shapes; wiring into adapters happens in [`crate::server`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::notifications::DispatcherConfig;
use crate::inbound::http::session_config::SessionToggles;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_AI_MODEL: &str = "gemini-pro";
const DEFAULT_SENDER_NAME: &str = "RS Sentra Medika";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

fn default_demo_data_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("demo-data.json")
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid URL for {name} '{value}': {source}")]
    Url {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} requires {missing}")]
    Incomplete {
        name: &'static str,
        missing: &'static str,
    },
}

/// Runtime configuration for the server and the seeding binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BLOOD_BANK")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; in-memory storage when unset.
    pub database_url: Option<String>,
    /// Path to the session signing key.
    pub session_key_file: Option<PathBuf>,
    pub session_cookie_secure: Option<bool>,
    pub session_same_site: Option<String>,
    pub session_allow_ephemeral: Option<bool>,
    /// Run the background notification sweeps; enabled when unset.
    pub scheduler_enabled: Option<bool>,
    /// Concurrent mail sends per dispatch.
    pub dispatch_concurrency: Option<usize>,
    /// Timeout for one mail send, in seconds.
    pub dispatch_timeout_secs: Option<u64>,
    /// Gap between successive sends, in milliseconds.
    pub dispatch_delay_ms: Option<u64>,
    pub ai_base_url: Option<String>,
    /// API key for the content generator; fallback templates when unset.
    pub ai_api_key: Option<String>,
    pub ai_model: Option<String>,
    /// Mail relay endpoint; messages are logged instead when unset.
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
    pub mail_sender_name: Option<String>,
    pub mail_sender_address: Option<String>,
    /// JSON fixture read by `seed-demo-data`.
    pub demo_data_file: Option<PathBuf>,
}

/// Validated content generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGeneratorSettings {
    pub base_url: Url,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Validated mail relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailRelaySettings {
    pub endpoint: Url,
    pub token: String,
    pub sender_name: String,
    pub sender_address: String,
    pub timeout: Duration,
}

impl AppSettings {
    /// Parse the configured bind address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddress`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddress {
            value: value.to_owned(),
            source,
        })
    }

    /// Database URL when one is configured and non-blank.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Session toggles for [`crate::inbound::http::session_config`].
    pub fn session_toggles(&self) -> SessionToggles {
        SessionToggles {
            key_file: self.session_key_file.clone(),
            cookie_secure: self.session_cookie_secure,
            same_site: self.session_same_site.clone(),
            allow_ephemeral: self.session_allow_ephemeral,
        }
    }

    /// Whether the background notification sweeps should run.
    pub fn scheduler_enabled(&self) -> bool {
        self.scheduler_enabled.unwrap_or(true)
    }

    /// Dispatcher tuning with defaults for unset values.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let defaults = DispatcherConfig::default();
        DispatcherConfig {
            max_concurrent_sends: self
                .dispatch_concurrency
                .unwrap_or(defaults.max_concurrent_sends),
            send_timeout: self
                .dispatch_timeout_secs
                .map_or(defaults.send_timeout, Duration::from_secs),
            send_spacing: self
                .dispatch_delay_ms
                .map_or(defaults.send_spacing, Duration::from_millis),
        }
    }

    /// Content generator settings, or `None` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Url`] when the base URL does not parse.
    pub fn content_generator(&self) -> Result<Option<ContentGeneratorSettings>, SettingsError> {
        let Some(api_key) = non_blank(self.ai_api_key.as_deref()) else {
            return Ok(None);
        };
        let base_url = parse_url(
            "ai_base_url",
            self.ai_base_url.as_deref().unwrap_or(DEFAULT_AI_BASE_URL),
        )?;
        Ok(Some(ContentGeneratorSettings {
            base_url,
            model: self
                .ai_model
                .clone()
                .unwrap_or_else(|| DEFAULT_AI_MODEL.to_owned()),
            api_key: api_key.to_owned(),
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        }))
    }

    /// Mail relay settings, or `None` when no relay URL is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL does not parse or the token or sender
    /// address is missing.
    pub fn mail_relay(&self) -> Result<Option<MailRelaySettings>, SettingsError> {
        let Some(url) = non_blank(self.mail_relay_url.as_deref()) else {
            return Ok(None);
        };
        let endpoint = parse_url("mail_relay_url", url)?;
        let token = non_blank(self.mail_relay_token.as_deref()).ok_or(SettingsError::Incomplete {
            name: "mail_relay_url",
            missing: "mail_relay_token",
        })?;
        let sender_address = non_blank(self.mail_sender_address.as_deref()).ok_or(
            SettingsError::Incomplete {
                name: "mail_relay_url",
                missing: "mail_sender_address",
            },
        )?;
        Ok(Some(MailRelaySettings {
            endpoint,
            token: token.to_owned(),
            sender_name: self
                .mail_sender_name
                .clone()
                .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_owned()),
            sender_address: sender_address.to_owned(),
            timeout: self.dispatcher_config().send_timeout,
        }))
    }

    /// Demo data fixture path, falling back to the bundled fixture.
    pub fn demo_data_file(&self) -> PathBuf {
        self.demo_data_file
            .clone()
            .unwrap_or_else(default_demo_data_path)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|source| SettingsError::Url {
        name,
        value: value.to_owned(),
        source,
    })
}
