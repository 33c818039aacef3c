//! Mail delivery adapters.
//!
//! `HttpMailRelay` posts rendered messages to a JSON relay. `LoggingMailDelivery`
//! writes them to the log instead and is the default when no relay is set.

mod http_relay;
mod logging;

pub use http_relay::{HttpMailRelay, HttpMailRelayConfig, MailSender};
pub use logging::LoggingMailDelivery;
