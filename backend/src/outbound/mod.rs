//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations; they contain no business logic.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM
//! - **memory**: in-process repositories used when no database is configured
//! - **content**: language-model text generation over HTTP
//! - **mail**: HTTP mail relay and a logging sink
//! - **credentials**: Argon2id password hashes
//! - **metrics**: Prometheus exporters (feature-gated)

pub mod content;
pub mod credentials;
mod http_preview;
pub mod mail;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
