//! Semantic configuration checks, separate from serde's syntactic ones.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single failed check, with enough context to fix the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError("service.name must not be empty".into()));
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError(format!(
            "listener.bind_address is not a socket address: {}",
            config.listener.bind_address
        )));
    }
    if config.fanout.default_downstream.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError(format!(
            "fanout.default_downstream is not a socket address: {}",
            config.fanout.default_downstream
        )));
    }

    let mut seen = HashSet::new();
    for downstream in &config.downstreams {
        if downstream.name.trim().is_empty() {
            errors.push(ValidationError("downstream name must not be empty".into()));
        } else if !seen.insert(downstream.name.as_str()) {
            errors.push(ValidationError(format!(
                "duplicate downstream name: {}",
                downstream.name
            )));
        }
        if downstream.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError(format!(
                "downstream {} address is not a socket address: {}",
                downstream.name, downstream.address
            )));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError("timeouts.request_secs must be positive".into()));
    }
    if config.timeouts.downstream_secs == 0 {
        errors.push(ValidationError("timeouts.downstream_secs must be positive".into()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
