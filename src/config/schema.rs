//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for one service
//! instance. All types derive Serde traits for deserialization from config
//! files, and every field has a default so a minimal config (or none at
//! all) still runs.

use serde::{Deserialize, Serialize};

use crate::fanout::FanoutTarget;

/// Environment variable naming the tracing backend endpoint.
pub const ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Fallback tracing backend endpoint when neither env nor config names one.
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4318/v1/traces";

/// Root configuration for one service instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service identity.
    pub service: ServiceInfo,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Known downstream peers, by logical name.
    pub downstreams: Vec<DownstreamConfig>,

    /// Fan-out behavior for the relay route.
    pub fanout: FanoutConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Span export settings.
    pub tracing: TracingConfig,
}

/// Service identity, one per process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Logical service name, stamped on every exported span.
    pub name: String,

    /// Reported service version.
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "service-1".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
        }
    }
}

/// One downstream peer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownstreamConfig {
    /// Logical service name used by handlers.
    pub name: String,

    /// Address (e.g., "127.0.0.1:3002").
    pub address: String,
}

/// Fan-out behavior for the relay route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Address used when discovery has no entry for a logical name.
    pub default_downstream: String,

    /// Downstream calls issued by the relay route, in order.
    pub targets: Vec<FanoutTarget>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            default_downstream: "127.0.0.1:3002".to_string(),
            targets: vec![FanoutTarget {
                service: "service-2".to_string(),
                path: "/".to_string(),
            }],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request deadline in seconds.
    pub request_secs: u64,

    /// Per-downstream-call deadline in seconds.
    pub downstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            downstream_secs: 5,
        }
    }
}

/// Span export settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Log each closed span as a structured log line.
    pub console_enabled: bool,

    /// Ship closed spans to the tracing backend.
    pub otlp_enabled: bool,

    /// Tracing backend endpoint. The `OTEL_EXPORTER_OTLP_ENDPOINT`
    /// environment variable takes precedence over this field.
    pub otlp_endpoint: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            otlp_enabled: true,
            otlp_endpoint: None,
        }
    }
}

impl TracingConfig {
    /// Endpoint precedence: environment, then config, then the fixed
    /// default. Read once during recorder initialization.
    pub fn resolved_endpoint(&self) -> String {
        std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.otlp_endpoint.clone())
            .unwrap_or_else(|| DEFAULT_OTLP_ENDPOINT.to_string())
    }
}
