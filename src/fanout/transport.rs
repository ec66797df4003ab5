//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Issue one GET to a downstream service with the caller's headers
//! - Enforce a deadline on every call
//! - Distinguish timeouts from connection failures in the error type
//!
//! # Design Decisions
//! - Trait object seam so the orchestrator can be tested without sockets
//! - Bodies are buffered with a fixed cap; these are small demo payloads

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

/// Cap on buffered downstream response bodies.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("invalid downstream url: {0}")]
    InvalidUrl(String),
    #[error("failed to build downstream request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("failed to read downstream body: {0}")]
    Body(#[source] axum::Error),
}

/// A downstream response with its body buffered.
#[derive(Debug, Clone)]
pub struct DownstreamReply {
    pub status: StatusCode,
    pub body: String,
}

/// The single outbound capability handlers get: one GET, headers included,
/// deadline enforced.
#[async_trait]
pub trait DownstreamTransport: Send + Sync {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<DownstreamReply, TransportError>;
}

/// hyper-based transport used in production.
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }
}

#[async_trait]
impl DownstreamTransport for HttpTransport {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<DownstreamReply, TransportError> {
        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|_| TransportError::InvalidUrl(url.to_string()))?;

        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(outbound) = builder.headers_mut() {
            for (key, value) in headers.iter() {
                outbound.insert(key.clone(), value.clone());
            }
        }
        let request = builder.body(Body::empty())?;

        let response = match tokio::time::timeout(self.timeout, self.client.request(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => return Err(TransportError::Connect(error)),
            Err(_) => return Err(TransportError::Timeout(self.timeout)),
        };

        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), MAX_BODY_BYTES)
            .await
            .map_err(TransportError::Body)?;

        Ok(DownstreamReply {
            status: parts.status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}
