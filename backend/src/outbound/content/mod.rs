//! Language-model outbound adapters.
//!
//! This module provides a reqwest implementation of the `ContentGenerator`
//! port against a `generateContent` style JSON API.

mod dto;
mod http_generator;

pub use http_generator::{HttpContentGenerator, HttpContentGeneratorConfig};
