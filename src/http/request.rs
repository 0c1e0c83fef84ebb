//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Build the telemetry [`Context`] for a request from its W3C trace headers
//! - Write the current trace context back onto response headers
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A malformed `traceparent` is ignored; the request starts a new trace

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::observability::Context;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request-id generator backed by random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Reads trace headers from an HTTP header map.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Writes trace headers into an HTTP header map.
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if value.is_empty() {
            return;
        }
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(&value)) {
            self.0.insert(name, value);
        }
    }
}

/// Telemetry context parented on the incoming `traceparent`, if any.
pub fn trace_context(headers: &HeaderMap) -> Context {
    let cx = TraceContextPropagator::new()
        .extract_with_context(&opentelemetry::Context::new(), &HeaderExtractor(headers));
    Context::from_otel(cx)
}

/// Write `cx`'s current span as `traceparent` (and `tracestate`) headers.
/// Leaves `headers` untouched when `cx` carries no span.
pub fn inject_trace_context(cx: &Context, headers: &mut HeaderMap) {
    TraceContextPropagator::new().inject_context(cx.as_otel(), &mut HeaderInjector(headers));
}

/// Extractor yielding the request's telemetry [`Context`].
#[derive(Debug, Clone)]
pub struct RequestContext(pub Context);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(trace_context(&parts.headers)))
    }
}
