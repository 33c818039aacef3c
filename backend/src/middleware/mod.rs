//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! per-request trace ids.

pub mod trace;

pub use trace::Trace;
