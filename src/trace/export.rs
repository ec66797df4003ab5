//! Span exporters.
//!
//! # Responsibilities
//! - Receive each closed span record exactly once
//! - Ship it somewhere useful (log line, tracing backend, test buffer)
//!
//! # Design Decisions
//! - Export is fire-and-forget: the HTTP exporter posts from a spawned task
//!   and failures are logged, never propagated to the request path
//! - The wire format to the backend is a plain JSON rendering of the record;
//!   the backend side is an external collaborator

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::trace::span::SpanRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid exporter endpoint: {0}")]
    Endpoint(String),
    #[error("failed to serialize span: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build export request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("no async runtime available for export")]
    NoRuntime,
}

/// Receives closed spans. Implementations must not block the caller.
pub trait SpanExporter: Send + Sync {
    fn export(&self, span: &SpanRecord) -> Result<(), ExportError>;
}

/// Writes one structured log line per closed span.
#[derive(Debug, Default)]
pub struct ConsoleExporter;

impl SpanExporter for ConsoleExporter {
    fn export(&self, span: &SpanRecord) -> Result<(), ExportError> {
        tracing::info!(
            target: "traced_service::span",
            service = %span.service,
            name = %span.name,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            parent_span_id = ?span.parent_span_id.map(|id| id.to_string()),
            status = ?span.status,
            duration_ms = span.duration_micros as f64 / 1000.0,
            attributes = ?span.attributes,
            "span closed"
        );
        Ok(())
    }
}

/// Posts each span as JSON to a tracing backend endpoint.
pub struct OtlpHttpExporter {
    endpoint: Uri,
    client: Client<HttpConnector, Body>,
}

impl OtlpHttpExporter {
    pub fn new(endpoint: &str) -> Result<Self, ExportError> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|_| ExportError::Endpoint(endpoint.to_string()))?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }
}

impl SpanExporter for OtlpHttpExporter {
    fn export(&self, span: &SpanRecord) -> Result<(), ExportError> {
        let payload = serde_json::to_vec(span)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))?;

        let handle = tokio::runtime::Handle::try_current().map_err(|_| ExportError::NoRuntime)?;
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        handle.spawn(async move {
            match client.request(request).await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        status = %response.status(),
                        "tracing backend rejected span"
                    );
                }
                Err(error) => {
                    tracing::warn!(endpoint = %endpoint, %error, "span delivery failed");
                }
            }
        });
        Ok(())
    }
}

impl std::fmt::Debug for OtlpHttpExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtlpHttpExporter")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Buffers spans in memory so tests can assert on what was recorded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExporter {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().unwrap().clone()
    }
}

impl SpanExporter for InMemoryExporter {
    fn export(&self, span: &SpanRecord) -> Result<(), ExportError> {
        self.spans.lock().unwrap().push(span.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(OtlpHttpExporter::new("not a uri").is_err());
        assert!(OtlpHttpExporter::new("http://localhost:4318/v1/traces").is_ok());
    }

    #[test]
    fn test_span_record_serializes_ids_as_hex() {
        use crate::trace::context::TraceContext;
        use crate::trace::span::SpanStatus;

        let context = TraceContext::new_root().child();
        let record = SpanRecord {
            service: "svc".into(),
            name: "GET /".into(),
            trace_id: context.trace_id,
            span_id: context.span_id,
            parent_span_id: context.parent_span_id,
            sampled: true,
            start_unix_nanos: 1,
            duration_micros: 2,
            status: SpanStatus::Ok,
            attributes: Default::default(),
        };

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["trace_id"], context.trace_id.to_string());
        assert_eq!(json["span_id"], context.span_id.to_string());
        assert_eq!(json["status"], "OK");
    }
}
