//! Test utilities for the backend crate.
//!
//! Shared helpers for unit tests (in `src/`) and behaviour tests (in
//! `tests/`): a settable clock, sample users, and notification doubles.
//! Compiled for tests and behind the `test-support` feature.

pub mod clock;
pub mod fixtures;
pub mod notifications;
