//! HTTP inbound adapter exposing REST endpoints under `/api/v1`.

pub mod accounts;
pub mod admin;
pub mod blood_requests;
pub mod blood_stocks;
pub mod donor_records;
pub mod error;
pub mod health;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
