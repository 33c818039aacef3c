//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin translators between Diesel rows and domain types;
//! rules stay in the domain. Connections come from a `bb8` pool through
//! `diesel-async`, and the schema is created by the embedded migrations.
//!
//! # Example
//!
//! ```ignore
//! use donor_backend::outbound::persistence::{
//!     DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
//! };
//!
//! run_pending_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_blood_request_repository;
mod diesel_blood_stock_repository;
mod diesel_donor_record_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_blood_request_repository::DieselBloodRequestRepository;
pub use diesel_blood_stock_repository::DieselBloodStockRepository;
pub use diesel_donor_record_repository::DieselDonorRecordRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
