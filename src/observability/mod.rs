//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Use cases and handlers call capabilities on a Telemetry bundle:
//!     → tracing.rs (Tracer: OpenTelemetry spans parented on the request Context)
//!     → metrics.rs (Metrics: counters, histograms)
//!     → logging.rs (Logger: structured lines with trace/span ids)
//!
//! Backends:
//!     → OpenTelemetry SDK → OTLP/gRPC collector (spans)
//!     → tracing subscriber (stdout, pretty or JSON)
//!     → Prometheus exporter (scrape endpoint)
//!     → Noop* (telemetry disabled, tests)
//! ```
//!
//! # Design Decisions
//! - Call sites depend on traits only; the bundle decides the backend
//! - The request Context is passed explicitly and carries the current span
//! - Emission never fails the caller

pub mod attributes;
pub mod context;
pub mod logging;
pub mod metrics;
pub mod resource;
pub mod tracing;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use opentelemetry::trace::TraceError;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use thiserror::Error;

use crate::config::validation::split_host_port;
use crate::config::TelemetryConfig;

pub use self::attributes::{KeyValue, Value};
pub use self::context::{Context, SpanContext, TRACEPARENT};
pub use self::logging::{Logger, NoopLogger, TracingLogger};
pub use self::metrics::{Metrics, NoopMetrics, RecorderMetrics};
pub use self::resource::ServiceResource;
pub use self::tracing::{in_span, NoopTracer, OtelTracer, Span, SpanStatus, Tracer};

/// Errors raised while wiring telemetry backends at startup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid {field} {value:?}")]
    InvalidEndpoint { field: &'static str, value: String },

    #[error("failed to build span exporter: {0}")]
    SpanExporter(#[from] TraceError),

    #[error("failed to install metrics exporter: {0}")]
    Exporter(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// The three telemetry capabilities handed to business code.
#[derive(Clone)]
pub struct Telemetry {
    tracer: Arc<dyn Tracer>,
    metrics: Arc<dyn Metrics>,
    logger: Arc<dyn Logger>,
    provider: Option<TracerProvider>,
}

impl Telemetry {
    pub fn new(tracer: Arc<dyn Tracer>, metrics: Arc<dyn Metrics>, logger: Arc<dyn Logger>) -> Self {
        Self {
            tracer,
            metrics,
            logger,
            provider: None,
        }
    }

    /// Every capability discards its input.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopTracer), Arc::new(NoopMetrics), Arc::new(NoopLogger))
    }

    /// Build the production bundle: spans exported over OTLP/gRPC to
    /// `config.endpoint`, Prometheus metrics served on
    /// `config.metrics_address`, logs through `tracing`. Returns the no-op
    /// bundle when telemetry is disabled.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        if !config.enabled {
            ::tracing::info!("Telemetry disabled, using no-op backends");
            return Ok(Self::noop());
        }

        if split_host_port(&config.endpoint).is_none() {
            return Err(TelemetryError::InvalidEndpoint {
                field: "telemetry.endpoint",
                value: config.endpoint.clone(),
            });
        }
        let metrics_addr: SocketAddr =
            config
                .metrics_address
                .parse()
                .map_err(|_| TelemetryError::InvalidEndpoint {
                    field: "telemetry.metrics_address",
                    value: config.metrics_address.clone(),
                })?;

        let resource = ServiceResource::from_config(config);
        let provider = init_tracer_provider(&config.endpoint, &resource)?;
        self::metrics::init_metrics(metrics_addr, &resource)?;

        Ok(Self {
            tracer: Arc::new(OtelTracer::from_provider(&provider)),
            metrics: Arc::new(RecorderMetrics),
            logger: Arc::new(TracingLogger),
            provider: Some(provider),
        })
    }

    pub fn tracer(&self) -> &dyn Tracer {
        self.tracer.as_ref()
    }

    pub fn metrics(&self) -> &dyn Metrics {
        self.metrics.as_ref()
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Flush buffered spans and stop the exporter. Blocks until the batch
    /// processor has drained, so call it off the async worker threads.
    pub fn shutdown(&self) {
        if let Some(provider) = &self.provider {
            if let Err(err) = provider.shutdown() {
                ::tracing::warn!(error = %err, "Span exporter shutdown failed");
            }
        }
    }
}

/// Tracer provider batching spans to the OTLP/gRPC collector at `endpoint`.
fn init_tracer_provider(
    endpoint: &str,
    resource: &ServiceResource,
) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(format!("http://{endpoint}"))
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(resource.to_resource())
        .build();

    ::tracing::info!(endpoint = %endpoint, "Span exporter configured");
    Ok(provider)
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("exporting", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}
