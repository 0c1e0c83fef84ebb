//! Service identity attached to every span and metric.

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

use crate::config::TelemetryConfig;

/// Who is emitting telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResource {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
}

impl ServiceResource {
    pub fn new(
        service_name: impl Into<String>,
        service_version: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            environment: environment.into(),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.service_name.clone(),
            config.service_version.clone(),
            config.environment.clone(),
        )
    }

    /// The SDK resource attached to every exported span.
    pub fn to_resource(&self) -> Resource {
        Resource::new([
            KeyValue::new("service.name", self.service_name.clone()),
            KeyValue::new("service.version", self.service_version.clone()),
            KeyValue::new("deployment.environment", self.environment.clone()),
        ])
    }
}

impl Default for ServiceResource {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), "development")
    }
}
