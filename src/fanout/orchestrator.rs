//! Sequencing and failure handling for downstream calls.
//!
//! Before each outbound call the current span's context is injected into the
//! request headers, so the downstream handler span shares the trace id and
//! records this span as its parent. Failures are caught here: the span is
//! marked ERROR with the failure message, and the caller degrades the
//! response instead of surfacing the raw error.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::fanout::discovery::ServiceDiscovery;
use crate::fanout::transport::{DownstreamReply, DownstreamTransport, TransportError};
use crate::trace::propagation;
use crate::trace::span::{AttrValue, SharedSpan};

/// One downstream call: logical service name plus request path.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FanoutTarget {
    pub service: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Network failure or timeout; the downstream never answered.
    #[error("downstream {service} unavailable: {source}")]
    Unavailable {
        service: String,
        #[source]
        source: TransportError,
    },
    /// The downstream answered with a non-2xx status.
    #[error("downstream {service} returned {status}")]
    Status { service: String, status: StatusCode },
}

/// Sequences outbound calls for a handler and owns their failure policy.
pub struct FanoutOrchestrator {
    transport: Arc<dyn DownstreamTransport>,
    discovery: Arc<dyn ServiceDiscovery>,
    default_target: Url,
}

impl FanoutOrchestrator {
    pub fn new(
        transport: Arc<dyn DownstreamTransport>,
        discovery: Arc<dyn ServiceDiscovery>,
        default_target: Url,
    ) -> Self {
        Self {
            transport,
            discovery,
            default_target,
        }
    }

    fn target_for(&self, service: &str) -> Url {
        self.discovery
            .resolve(service)
            .unwrap_or_else(|| self.default_target.clone())
    }

    /// One traced downstream call.
    ///
    /// Injects the span's context, awaits the reply, and treats timeouts,
    /// connection failures, and non-2xx statuses uniformly: span marked
    /// ERROR with the message recorded, error returned for degradation.
    pub async fn call(
        &self,
        span: &SharedSpan,
        service: &str,
        path: &str,
    ) -> Result<DownstreamReply, DownstreamError> {
        let mut url = self.target_for(service);
        url.set_path(path);

        let mut headers = HeaderMap::new();
        if let Some(context) = span.context() {
            propagation::inject(&context, &mut headers);
        }
        if let Some(AttrValue::Str(request_id)) = span.attribute("request_id") {
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                headers.insert("x-request-id", value);
            }
        }
        span.set_attribute("peer.service", service);

        tracing::debug!(service = %service, url = %url, "calling downstream");

        match self.transport.get(&url, headers).await {
            Ok(reply) if reply.status.is_success() => Ok(reply),
            Ok(reply) => {
                let error = DownstreamError::Status {
                    service: service.to_string(),
                    status: reply.status,
                };
                tracing::warn!(service = %service, status = %reply.status, "downstream error status");
                span.set_error(error.to_string());
                Err(error)
            }
            Err(source) => {
                let error = DownstreamError::Unavailable {
                    service: service.to_string(),
                    source,
                };
                tracing::warn!(service = %service, %error, "downstream unavailable");
                span.set_error(error.to_string());
                Err(error)
            }
        }
    }

    /// Await each target in order; stop at the first failure.
    pub async fn fan_out(
        &self,
        span: &SharedSpan,
        targets: &[FanoutTarget],
    ) -> Result<Vec<DownstreamReply>, DownstreamError> {
        let mut replies = Vec::with_capacity(targets.len());
        for target in targets {
            replies.push(self.call(span, &target.service, &target.path).await?);
        }
        Ok(replies)
    }
}

impl std::fmt::Debug for FanoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutOrchestrator")
            .field("default_target", &self.default_target.as_str())
            .finish()
    }
}
