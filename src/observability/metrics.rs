//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Counter and histogram capability behind the [`Metrics`] trait
//! - Install the Prometheus exporter with service-wide global labels
//! - Name the metrics the service emits
//!
//! # Metrics
//! - `user_usecase_calls_total` (counter): user lookups by outcome
//! - `user_fetch_duration_seconds` (histogram): lookup latency by outcome
//! - `http_requests_total` (counter): requests by route, status
//! - `http_request_duration_seconds` (histogram): request latency
//!
//! # Design Decisions
//! - Observations are fire-and-forget; exporter failures never reach callers
//! - Label values are stringified from [`Value`](crate::observability::Value)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::observability::attributes::KeyValue;
use crate::observability::context::Context;
use crate::observability::resource::ServiceResource;
use crate::observability::TelemetryError;

pub const USECASE_CALLS_TOTAL: &str = "user_usecase_calls_total";
pub const USER_FETCH_DURATION_SECONDS: &str = "user_fetch_duration_seconds";
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Metrics capability.
pub trait Metrics: Send + Sync {
    fn add_counter(&self, cx: &Context, name: &str, delta: u64, labels: &[KeyValue]);
    fn record_histogram(&self, cx: &Context, name: &str, value: f64, labels: &[KeyValue]);
}

/// Metrics that go nowhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn add_counter(&self, _cx: &Context, _name: &str, _delta: u64, _labels: &[KeyValue]) {}

    fn record_histogram(&self, _cx: &Context, _name: &str, _value: f64, _labels: &[KeyValue]) {}
}

/// Metrics emitted through the `metrics` facade to whatever recorder is
/// installed (the Prometheus exporter in production).
///
/// The context is not used: Prometheus has no exemplar support here.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderMetrics;

impl Metrics for RecorderMetrics {
    fn add_counter(&self, _cx: &Context, name: &str, delta: u64, labels: &[KeyValue]) {
        metrics::counter!(name.to_string(), to_labels(labels)).increment(delta);
    }

    fn record_histogram(&self, _cx: &Context, name: &str, value: f64, labels: &[KeyValue]) {
        metrics::histogram!(name.to_string(), to_labels(labels)).record(value);
    }
}

fn to_labels(labels: &[KeyValue]) -> Vec<Label> {
    labels
        .iter()
        .map(|kv| Label::new(kv.key.to_string(), kv.value.to_string()))
        .collect()
}

/// Record one served HTTP request.
pub fn record_request(
    metrics: &dyn Metrics,
    cx: &Context,
    method: &str,
    route: &str,
    status: u16,
    start: Instant,
) {
    let labels = [
        KeyValue::new("method", method.to_string()),
        KeyValue::new("route", route.to_string()),
        KeyValue::new("status", status),
    ];
    metrics.add_counter(cx, HTTP_REQUESTS_TOTAL, 1, &labels);
    metrics.record_histogram(cx, HTTP_REQUEST_DURATION_SECONDS, start.elapsed().as_secs_f64(), &labels);
}

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr, resource: &ServiceResource) -> Result<(), TelemetryError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service_name", resource.service_name.clone())
        .add_global_label("service_version", resource.service_version.clone())
        .add_global_label("deployment_environment", resource.environment.clone())
        .install()?;

    describe_metrics();

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(USECASE_CALLS_TOTAL, "User lookups by outcome");
    metrics::describe_histogram!(
        USER_FETCH_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "User lookup latency"
    );
    metrics::describe_counter!(HTTP_REQUESTS_TOTAL, "HTTP requests by route and status");
    metrics::describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
}
