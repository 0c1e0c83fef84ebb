//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::Level;
use user_service::observability::{
    Context, KeyValue, Logger, Metrics, OtelTracer, SpanContext, Telemetry,
};
use user_service::{HttpServer, ServiceConfig, Shutdown};

/// A server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to exit.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed");
    }
}

/// Start a server with the given telemetry bundle.
pub async fn spawn_server(telemetry: Telemetry) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ServiceConfig::default();
    config.listener.bind_address = addr.to_string();
    config.telemetry.enabled = false;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, telemetry);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// One observation captured by [`RecordingMetrics`].
#[derive(Debug, Clone)]
pub struct Observation {
    pub name: String,
    pub labels: Vec<KeyValue>,
}

impl Observation {
    pub fn label(&self, key: &str) -> Option<String> {
        self.labels
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.to_string())
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    pub counters: Mutex<Vec<Observation>>,
    pub histograms: Mutex<Vec<Observation>>,
}

impl Metrics for RecordingMetrics {
    fn add_counter(&self, _cx: &Context, name: &str, _delta: u64, labels: &[KeyValue]) {
        self.counters.lock().unwrap().push(Observation {
            name: name.to_string(),
            labels: labels.to_vec(),
        });
    }

    fn record_histogram(&self, _cx: &Context, name: &str, _value: f64, labels: &[KeyValue]) {
        self.histograms.lock().unwrap().push(Observation {
            name: name.to_string(),
            labels: labels.to_vec(),
        });
    }
}

/// One line captured by [`RecordingLogger`].
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
    pub span: Option<SpanContext>,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct RecordingLogger {
    pub lines: Mutex<Vec<LogLine>>,
}

impl Logger for RecordingLogger {
    fn log(
        &self,
        cx: &Context,
        level: Level,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        _fields: &[KeyValue],
    ) {
        self.lines.lock().unwrap().push(LogLine {
            level,
            message: message.to_string(),
            span: cx.span_context(),
            error: error.map(|e| e.to_string()),
        });
    }
}

/// Telemetry with an SDK tracer (no exporter) and capturing metrics and logger.
pub fn recording_telemetry() -> (Telemetry, Arc<RecordingMetrics>, Arc<RecordingLogger>) {
    let metrics = Arc::new(RecordingMetrics::default());
    let logger = Arc::new(RecordingLogger::default());
    let provider = opentelemetry_sdk::trace::TracerProvider::builder().build();
    let telemetry = Telemetry::new(
        Arc::new(OtelTracer::from_provider(&provider)),
        metrics.clone(),
        logger.clone(),
    );
    (telemetry, metrics, logger)
}
