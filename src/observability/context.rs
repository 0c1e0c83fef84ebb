//! Ambient trace context.
//!
//! A [`Context`] is passed explicitly through every call that may emit
//! telemetry. It wraps an OpenTelemetry context, so the current span travels
//! with it and child spans and log lines can be correlated without the
//! caller doing anything else.

use opentelemetry::trace::TraceContextExt;

pub use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};

/// W3C trace-context header name.
pub const TRACEPARENT: &str = "traceparent";

/// Request-scoped context. `Context::default()` carries no span.
#[derive(Debug, Clone, Default)]
pub struct Context(opentelemetry::Context);

impl Context {
    /// Empty context with no active span.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context whose current span is the remote span `span`, e.g. one
    /// extracted from an incoming request.
    pub fn with_span(span: SpanContext) -> Self {
        Self(opentelemetry::Context::new().with_remote_span_context(span))
    }

    pub fn from_otel(cx: opentelemetry::Context) -> Self {
        Self(cx)
    }

    pub fn as_otel(&self) -> &opentelemetry::Context {
        &self.0
    }

    /// Identity of the current span, `None` when there is no valid one.
    pub fn span_context(&self) -> Option<SpanContext> {
        let span = self.0.span();
        let sc = span.span_context();
        sc.is_valid().then(|| sc.clone())
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.span_context() == other.span_context()
    }
}
