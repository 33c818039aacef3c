//! Outbound adapters for metrics exporting.
//!
//! Prometheus-backed implementations of domain metrics ports, compiled only
//! with the `metrics` feature.

mod prometheus_notifications;

pub use prometheus_notifications::PrometheusNotificationMetrics;
