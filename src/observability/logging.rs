//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber (filter + pretty or JSON output)
//! - Logging capability behind the [`Logger`] trait
//! - Attach `trace_id`/`span_id` from the context to every log line
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured filter
//! - Each level method maps to the same `tracing` level

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::observability::attributes::{DisplayAttributes, KeyValue};
use crate::observability::context::Context;
use crate::observability::TelemetryError;

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let (pretty, json) = match config.format {
        LogFormat::Pretty => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()?;

    Ok(())
}

/// Logging capability.
pub trait Logger: Send + Sync {
    fn log(
        &self,
        cx: &Context,
        level: Level,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        fields: &[KeyValue],
    );

    fn debug(&self, cx: &Context, message: &str, fields: &[KeyValue]) {
        self.log(cx, Level::DEBUG, message, None, fields);
    }

    fn info(&self, cx: &Context, message: &str, fields: &[KeyValue]) {
        self.log(cx, Level::INFO, message, None, fields);
    }

    fn warn(&self, cx: &Context, message: &str, fields: &[KeyValue]) {
        self.log(cx, Level::WARN, message, None, fields);
    }

    fn error(
        &self,
        cx: &Context,
        error: &(dyn std::error::Error + 'static),
        message: &str,
        fields: &[KeyValue],
    ) {
        self.log(cx, Level::ERROR, message, Some(error), fields);
    }
}

/// Logger that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(
        &self,
        _cx: &Context,
        _level: Level,
        _message: &str,
        _error: Option<&(dyn std::error::Error + 'static)>,
        _fields: &[KeyValue],
    ) {
    }
}

/// Logger that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(
        &self,
        cx: &Context,
        level: Level,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        fields: &[KeyValue],
    ) {
        let mut correlated = correlation_fields(cx);
        correlated.extend_from_slice(fields);
        let fields = DisplayAttributes(&correlated);
        let error = error.map(error_chain);

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    error = error.as_deref(),
                    fields = %fields,
                    "{}",
                    message
                )
            };
        }

        if level == Level::ERROR {
            emit!(Level::ERROR);
        } else if level == Level::WARN {
            emit!(Level::WARN);
        } else if level == Level::INFO {
            emit!(Level::INFO);
        } else if level == Level::DEBUG {
            emit!(Level::DEBUG);
        } else {
            emit!(Level::TRACE);
        }
    }
}

/// Correlation fields for `cx`, empty when it carries no span.
pub fn correlation_fields(cx: &Context) -> Vec<KeyValue> {
    match cx.span_context() {
        Some(sc) => vec![
            KeyValue::new("trace_id", sc.trace_id().to_string()),
            KeyValue::new("span_id", sc.span_id().to_string()),
        ],
        None => Vec::new(),
    }
}

/// `err` followed by each of its sources, separated by `: `.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, ServiceError};
    use crate::observability::context::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingLogger {
        lines: Mutex<Vec<(Level, String, Option<String>)>>,
    }

    impl Logger for CapturingLogger {
        fn log(
            &self,
            _cx: &Context,
            level: Level,
            message: &str,
            error: Option<&(dyn std::error::Error + 'static)>,
            _fields: &[KeyValue],
        ) {
            self.lines
                .lock()
                .unwrap()
                .push((level, message.to_string(), error.map(error_chain)));
        }
    }

    #[test]
    fn test_level_methods_map_to_matching_level() {
        let logger = CapturingLogger::default();
        let cx = Context::background();
        let err = ServiceError::unexpected("boom");

        logger.debug(&cx, "d", &[]);
        logger.info(&cx, "i", &[]);
        logger.warn(&cx, "w", &[]);
        logger.error(&cx, &err, "e", &[]);

        let lines = logger.lines.lock().unwrap();
        let levels: Vec<Level> = lines.iter().map(|(l, _, _)| *l).collect();
        assert_eq!(levels, vec![Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR]);
        assert_eq!(lines[3].2.as_deref(), Some("unexpected failure: boom"));
    }

    #[test]
    fn test_correlation_fields_only_with_span() {
        assert!(correlation_fields(&Context::background()).is_empty());

        let sc = SpanContext::new(
            TraceId::from_hex("ab").unwrap(),
            SpanId::from_hex("cd").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let fields = correlation_fields(&Context::with_span(sc));
        assert_eq!(
            fields,
            vec![
                KeyValue::new("trace_id", "000000000000000000000000000000ab"),
                KeyValue::new("span_id", "00000000000000cd"),
            ]
        );
    }

    #[test]
    fn test_error_chain_walks_sources() {
        let err = DomainError::not_found("user not found").with_source("row missing");
        assert_eq!(error_chain(&err), "[NOT_FOUND] user not found: row missing");
    }

    // The only test in this crate that installs the global subscriber.
    #[test]
    fn test_init_logging_json_installs_once() {
        let config = LoggingConfig {
            filter: "user_service=info".into(),
            format: LogFormat::Json,
        };

        init_logging(&config).expect("first install");
        TracingLogger.info(&Context::background(), "json logging ready", &[KeyValue::new("format", "json")]);

        assert!(matches!(init_logging(&config), Err(TelemetryError::Subscriber(_))));
    }

    #[test]
    fn test_tracing_logger_emits_without_panicking() {
        let cx = Context::with_span(SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        ));
        TracingLogger.info(&cx, "hello", &[KeyValue::new("id", "123")]);
        NoopLogger.warn(&cx, "ignored", &[]);
    }
}
