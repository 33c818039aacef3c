//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, password hashing, content generation, mail
//! delivery, metrics) are implemented by outbound adapters. Driving ports
//! (commands and queries) are implemented by domain services and called by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod blood_request_command;
mod blood_request_query;
mod blood_request_repository;
mod blood_stock_command;
mod blood_stock_query;
mod blood_stock_repository;
mod content_generator;
mod dashboard_query;
mod donation_command;
mod donation_query;
mod donor_record_repository;
mod mail_delivery;
mod notification_metrics;
mod notification_sender;
mod notification_trigger;
mod password_hasher;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{AccountService, RegisterUserRequest};
#[cfg(test)]
pub use blood_request_command::MockBloodRequestCommand;
pub use blood_request_command::{
    BloodRequestCommand, SubmitBloodRequest, TransitionOutcome, TransitionRequest,
};
pub use blood_request_query::BloodRequestQuery;
#[cfg(test)]
pub use blood_request_query::MockBloodRequestQuery;
pub use blood_request_repository::{BloodRequestRepository, BloodRequestRepositoryError};
#[cfg(test)]
pub use blood_request_repository::MockBloodRequestRepository;
pub use blood_stock_command::BloodStockCommand;
#[cfg(test)]
pub use blood_stock_command::MockBloodStockCommand;
pub use blood_stock_query::BloodStockQuery;
#[cfg(test)]
pub use blood_stock_query::MockBloodStockQuery;
pub use blood_stock_repository::{BloodStockRepository, BloodStockRepositoryError};
#[cfg(test)]
pub use blood_stock_repository::MockBloodStockRepository;
#[cfg(test)]
pub use content_generator::MockContentGenerator;
pub use content_generator::{
    ContentGenerationError, ContentGenerator, ContentRequest, DisabledContentGenerator,
};
pub use dashboard_query::{AdminDashboard, DashboardQuery, SystemStatistics};
#[cfg(test)]
pub use dashboard_query::MockDashboardQuery;
pub use donation_command::{DonationCommand, ScheduleDonationRequest, ScheduleUpdate};
#[cfg(test)]
pub use donation_command::MockDonationCommand;
pub use donation_query::{DonationQuery, DonorDashboard};
#[cfg(test)]
pub use donation_query::MockDonationQuery;
pub use donor_record_repository::{DonorRecordRepository, DonorRecordRepositoryError};
#[cfg(test)]
pub use donor_record_repository::MockDonorRecordRepository;
pub use mail_delivery::{MailDelivery, MailDeliveryError, OutgoingMail};
#[cfg(test)]
pub use mail_delivery::MockMailDelivery;
#[cfg(test)]
pub use notification_metrics::MockNotificationMetrics;
pub use notification_metrics::{
    DispatchOutcome, NoOpNotificationMetrics, NotificationMetrics, NotificationMetricsError,
};
#[cfg(test)]
pub use notification_sender::MockNotificationSender;
pub use notification_sender::{NoOpNotificationSender, NotificationSender};
#[cfg(test)]
pub use notification_trigger::MockNotificationTrigger;
pub use notification_trigger::{JobReport, NotificationJob, NotificationTrigger};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
pub use users_query::UsersQuery;
#[cfg(test)]
pub use users_query::MockUsersQuery;
