//! User service binary.
//!
//! Loads configuration, installs logging and telemetry, then serves
//! `GET /users/{id}` until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use user_service::config::{load_config, validate_config, ConfigError, ServiceConfig};
use user_service::lifecycle::signals::shutdown_on_signal;
use user_service::observability::logging::init_logging;
use user_service::{HttpServer, Shutdown, Telemetry};

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "Example user lookup service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "USER_SERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long, env = "USER_SERVICE_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "user-service starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        telemetry_enabled = config.telemetry.enabled,
        telemetry_endpoint = %config.telemetry.endpoint,
        metrics_address = %config.telemetry.metrics_address,
        environment = %config.telemetry.environment,
        "Configuration loaded"
    );

    let telemetry = Telemetry::from_config(&config.telemetry)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, telemetry.clone());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
