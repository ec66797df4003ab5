//! Span creation and export dispatch.

use std::sync::Arc;

use crate::trace::context::TraceContext;
use crate::trace::export::SpanExporter;
use crate::trace::span::{ActiveSpan, SpanRecord};

/// Creates spans and hands closed records to the configured exporters.
///
/// Built once at startup and shared via `Arc` through application state; the
/// exporter list is never mutated after construction, so no locking is
/// needed.
pub struct SpanRecorder {
    service: String,
    exporters: Vec<Box<dyn SpanExporter>>,
}

impl SpanRecorder {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            exporters: Vec::new(),
        }
    }

    /// Register an exporter. Only valid during startup, before the recorder
    /// is shared.
    pub fn with_exporter(mut self, exporter: Box<dyn SpanExporter>) -> Self {
        self.exporters.push(exporter);
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Start a span. With a parent context the span joins that trace and
    /// links to the parent's span id; without one it becomes a trace root.
    pub fn start_span(
        self: &Arc<Self>,
        name: impl Into<String>,
        parent: Option<&TraceContext>,
    ) -> ActiveSpan {
        let context = match parent {
            Some(parent) => parent.child(),
            None => TraceContext::new_root(),
        };
        ActiveSpan::new(self.clone(), context, name.into())
    }

    /// Offer a closed record to every exporter. Export failures are logged
    /// and dropped; they must never reach the request path.
    pub(crate) fn finish(&self, record: SpanRecord) {
        if !record.sampled {
            return;
        }
        for exporter in &self.exporters {
            if let Err(error) = exporter.export(&record) {
                tracing::warn!(
                    service = %self.service,
                    span = %record.span_id,
                    %error,
                    "span export failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for SpanRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanRecorder")
            .field("service", &self.service)
            .field("exporters", &self.exporters.len())
            .finish()
    }
}
