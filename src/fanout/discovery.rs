//! Service discovery seam.
//!
//! Resolution of logical service names is an external concern; this module
//! only defines the seam and the static table used by the demo deployment.

use std::collections::HashMap;

use url::Url;

use crate::config::DownstreamConfig;

/// Resolves a logical service name to a base URL. Returning `None` lets the
/// caller fall back to its configured default address.
pub trait ServiceDiscovery: Send + Sync {
    fn resolve(&self, service: &str) -> Option<Url>;
}

/// Fixed name → address table built from configuration.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    entries: HashMap<String, Url>,
}

impl StaticDiscovery {
    pub fn from_config(downstreams: &[DownstreamConfig]) -> Self {
        let entries = downstreams
            .iter()
            .filter_map(|downstream| {
                match Url::parse(&format!("http://{}", downstream.address)) {
                    Ok(url) => Some((downstream.name.clone(), url)),
                    Err(error) => {
                        tracing::warn!(
                            name = %downstream.name,
                            address = %downstream.address,
                            %error,
                            "skipping unparseable downstream address"
                        );
                        None
                    }
                }
            })
            .collect();
        Self { entries }
    }
}

impl ServiceDiscovery for StaticDiscovery {
    fn resolve(&self, service: &str) -> Option<Url> {
        self.entries.get(service).cloned()
    }
}
