//! Distributed tracing capability.
//!
//! # Responsibilities
//! - Start child spans under the span carried by a [`Context`]
//! - Guarantee every span is ended exactly once
//! - Record outcome (`Ok`/`Error`) and attributes until the span ends
//!
//! # Design Decisions
//! - [`Span`] is a guard: dropping it ends the span, so early returns and
//!   `?` paths need no explicit call
//! - Backends implement [`SpanRecorder`]; call sites only see [`Tracer`]
//! - [`OtelTracer`] hands spans to the OpenTelemetry SDK; the returned
//!   [`Context`] carries the live span so children parent on it

use std::fmt;

use opentelemetry::trace::{Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry_sdk::trace::TracerProvider;

use crate::observability::attributes::KeyValue;
use crate::observability::context::{Context, SpanContext};

/// Final outcome of a span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error(String),
}

impl SpanStatus {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("unset"),
            Self::Ok => f.write_str("ok"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Backend half of a span. [`Span`] calls `end` at most once.
pub trait SpanRecorder: Send {
    fn set_attributes(&mut self, attributes: &[KeyValue]);
    fn set_status(&mut self, status: SpanStatus);
    fn end(&mut self);
}

/// Scoped handle to one traced operation.
pub struct Span {
    context: Option<SpanContext>,
    recorder: Option<Box<dyn SpanRecorder>>,
}

impl Span {
    pub fn new(context: SpanContext, recorder: Box<dyn SpanRecorder>) -> Self {
        Self {
            context: Some(context),
            recorder: Some(recorder),
        }
    }

    /// A span that records nothing.
    pub fn noop() -> Self {
        Self {
            context: None,
            recorder: None,
        }
    }

    pub fn span_context(&self) -> Option<&SpanContext> {
        self.context.as_ref()
    }

    /// True until the span has been ended.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Attach attributes. Ignored once the span has ended.
    pub fn set_attributes(&mut self, attributes: &[KeyValue]) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.set_attributes(attributes);
        }
    }

    /// Record the outcome. Ignored once the span has ended.
    pub fn set_status(&mut self, status: SpanStatus) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.set_status(status);
        }
    }

    /// End the span. Later calls are no-ops.
    pub fn end(&mut self) {
        if let Some(mut recorder) = self.recorder.take() {
            recorder.end();
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.end();
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("context", &self.context)
            .field("recording", &self.is_recording())
            .finish()
    }
}

/// Tracing capability.
pub trait Tracer: Send + Sync {
    /// Start a span as a child of the span in `cx` (or as a new trace root)
    /// and return a context carrying the new span.
    fn start_span(&self, cx: &Context, name: &str, attributes: &[KeyValue]) -> (Context, Span);
}

/// Run `f` inside a span named `name`, marking the span `Ok` or `Error`
/// from the result.
pub fn in_span<T, E, F>(tracer: &dyn Tracer, cx: &Context, name: &str, f: F) -> Result<T, E>
where
    F: FnOnce(&Context) -> Result<T, E>,
    E: fmt::Display,
{
    let (cx, mut span) = tracer.start_span(cx, name, &[]);
    let result = f(&cx);
    span.set_status(match &result {
        Ok(_) => SpanStatus::Ok,
        Err(err) => SpanStatus::error(err.to_string()),
    });
    result
}

/// Tracer that discards everything and leaves the context untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn start_span(&self, cx: &Context, _name: &str, _attributes: &[KeyValue]) -> (Context, Span) {
        (cx.clone(), Span::noop())
    }
}

/// Tracer backed by the OpenTelemetry SDK.
///
/// Span ids come from the SDK's id generator; finished spans go to whatever
/// processors the provider was built with.
#[derive(Debug, Clone)]
pub struct OtelTracer {
    tracer: opentelemetry_sdk::trace::Tracer,
    // Keeps the provider (and its processors) alive as long as the tracer.
    _provider: TracerProvider,
}

impl OtelTracer {
    /// Tracer named after this crate from `provider`.
    pub fn from_provider(provider: &TracerProvider) -> Self {
        Self {
            tracer: provider.tracer(env!("CARGO_PKG_NAME")),
            _provider: provider.clone(),
        }
    }
}

impl Tracer for OtelTracer {
    fn start_span(&self, cx: &Context, name: &str, attributes: &[KeyValue]) -> (Context, Span) {
        let span = self
            .tracer
            .span_builder(name.to_string())
            .with_attributes(attributes.iter().map(opentelemetry::KeyValue::from))
            .start_with_context(&self.tracer, cx.as_otel());

        let child = Context::from_otel(cx.as_otel().with_span(span));
        let span = match child.span_context() {
            Some(span_context) => Span::new(
                span_context,
                Box::new(OtelSpan {
                    cx: child.as_otel().clone(),
                }),
            ),
            None => Span::noop(),
        };

        (child, span)
    }
}

/// Handle on an SDK span stored in an OpenTelemetry context.
struct OtelSpan {
    cx: opentelemetry::Context,
}

impl SpanRecorder for OtelSpan {
    fn set_attributes(&mut self, attributes: &[KeyValue]) {
        let span = self.cx.span();
        for kv in attributes {
            span.set_attribute(kv.into());
        }
    }

    fn set_status(&mut self, status: SpanStatus) {
        self.cx.span().set_status(match status {
            SpanStatus::Unset => Status::Unset,
            SpanStatus::Ok => Status::Ok,
            SpanStatus::Error(message) => Status::error(message),
        });
    }

    fn end(&mut self) {
        self.cx.span().end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::context::{TraceFlags, TraceState};
    use opentelemetry_sdk::trace::{IdGenerator, RandomIdGenerator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn next_span_context(parent: Option<SpanContext>) -> SpanContext {
        let ids = RandomIdGenerator::default();
        let trace_id = parent.map_or_else(|| ids.new_trace_id(), |p| p.trace_id());
        SpanContext::new(
            trace_id,
            ids.new_span_id(),
            TraceFlags::SAMPLED,
            false,
            TraceState::default(),
        )
    }

    fn otel_tracer() -> OtelTracer {
        OtelTracer::from_provider(&TracerProvider::builder().build())
    }

    #[derive(Default)]
    struct Recorded {
        ends: AtomicUsize,
        statuses: Mutex<Vec<SpanStatus>>,
        attributes: Mutex<Vec<KeyValue>>,
    }

    struct RecordingTracer(Arc<Recorded>);

    struct RecordingSpan {
        shared: Arc<Recorded>,
        status: SpanStatus,
    }

    impl SpanRecorder for RecordingSpan {
        fn set_attributes(&mut self, attributes: &[KeyValue]) {
            self.shared.attributes.lock().unwrap().extend_from_slice(attributes);
        }

        fn set_status(&mut self, status: SpanStatus) {
            self.status = status;
        }

        fn end(&mut self) {
            self.shared.ends.fetch_add(1, Ordering::SeqCst);
            self.shared.statuses.lock().unwrap().push(self.status.clone());
        }
    }

    impl Tracer for RecordingTracer {
        fn start_span(&self, cx: &Context, _name: &str, attributes: &[KeyValue]) -> (Context, Span) {
            let sc = next_span_context(cx.span_context());
            let mut recorder = RecordingSpan {
                shared: self.0.clone(),
                status: SpanStatus::Unset,
            };
            recorder.set_attributes(attributes);
            (Context::with_span(sc.clone()), Span::new(sc, Box::new(recorder)))
        }
    }

    #[test]
    fn test_end_is_idempotent() {
        let recorded = Arc::new(Recorded::default());
        let tracer = RecordingTracer(recorded.clone());

        let (_, mut span) = tracer.start_span(&Context::background(), "op", &[]);
        span.end();
        span.end();
        drop(span);

        assert_eq!(recorded.ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_ends_span() {
        let recorded = Arc::new(Recorded::default());
        let tracer = RecordingTracer(recorded.clone());

        {
            let (_, _span) = tracer.start_span(&Context::background(), "op", &[]);
        }

        assert_eq!(recorded.ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_updates_after_end_are_ignored() {
        let recorded = Arc::new(Recorded::default());
        let tracer = RecordingTracer(recorded.clone());

        let (_, mut span) = tracer.start_span(&Context::background(), "op", &[KeyValue::new("a", 1)]);
        span.set_status(SpanStatus::Ok);
        span.end();
        assert!(!span.is_recording());
        span.set_status(SpanStatus::error("late"));
        span.set_attributes(&[KeyValue::new("b", 2)]);

        assert_eq!(*recorded.statuses.lock().unwrap(), vec![SpanStatus::Ok]);
        assert_eq!(recorded.attributes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_in_span_records_outcome() {
        let recorded = Arc::new(Recorded::default());
        let tracer = RecordingTracer(recorded.clone());
        let cx = Context::background();

        let ok: Result<u32, String> = in_span(&tracer, &cx, "ok", |_| Ok(1));
        let err: Result<u32, String> = in_span(&tracer, &cx, "err", |_| Err("nope".into()));

        assert_eq!(ok, Ok(1));
        assert!(err.is_err());
        assert_eq!(
            *recorded.statuses.lock().unwrap(),
            vec![SpanStatus::Ok, SpanStatus::error("nope")]
        );
    }

    #[test]
    fn test_in_span_hands_child_context_to_closure() {
        let tracer = otel_tracer();
        let parent = Context::with_span(next_span_context(None));

        let seen = in_span(&tracer, &parent, "op", |cx| Ok::<_, String>(cx.span_context()))
            .unwrap()
            .expect("closure context carries the span");

        let parent_sc = parent.span_context().unwrap();
        assert_eq!(seen.trace_id(), parent_sc.trace_id());
        assert_ne!(seen.span_id(), parent_sc.span_id());
    }

    #[test]
    fn test_otel_tracer_parents_on_context() {
        let tracer = otel_tracer();

        let (root_cx, root) = tracer.start_span(&Context::background(), "root", &[]);
        let (child_cx, child) = tracer.start_span(&root_cx, "child", &[KeyValue::new("user.id", "123")]);

        let root_sc = root.span_context().unwrap().clone();
        let child_sc = child.span_context().unwrap().clone();
        assert_eq!(root_cx.span_context(), Some(root_sc.clone()));
        assert_eq!(child_cx.span_context(), Some(child_sc.clone()));
        assert_eq!(root_sc.trace_id(), child_sc.trace_id());
        assert_ne!(root_sc.span_id(), child_sc.span_id());
    }

    #[test]
    fn test_otel_tracer_continues_remote_trace() {
        let tracer = otel_tracer();
        let remote = next_span_context(None);

        let (cx, mut span) = tracer.start_span(&Context::with_span(remote.clone()), "handler", &[]);
        assert!(span.is_recording());
        assert_eq!(cx.span_context().unwrap().trace_id(), remote.trace_id());

        span.set_status(SpanStatus::error("boom"));
        span.end();
        span.end();
        assert!(!span.is_recording());
    }

    #[test]
    fn test_noop_tracer_keeps_context() {
        let cx = Context::with_span(next_span_context(None));
        let (next, mut span) = NoopTracer.start_span(&cx, "op", &[]);
        assert_eq!(next, cx);
        assert!(!span.is_recording());
        span.end();
    }
}
