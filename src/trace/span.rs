//! Span records and the owned handles that close them.
//!
//! # Responsibilities
//! - Represent one timed operation with causal links to its parent
//! - Guarantee each span is closed exactly once, on every exit path
//! - Hand closed records to the recorder for export, immutable thereafter
//!
//! # Design Decisions
//! - `ActiveSpan` is a guard: dropping it unclosed records a
//!   `client-disconnected` error instead of leaking the span
//! - Ending twice or mutating after end is a debug assertion failure;
//!   release builds log a warning and ignore the call

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::trace::context::{SpanId, TraceContext, TraceId};
use crate::trace::recorder::SpanRecorder;

/// Final status of a closed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    Ok,
    Error,
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// An immutable record of one closed span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub service: String,
    pub name: String,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub sampled: bool,
    pub start_unix_nanos: u64,
    pub duration_micros: u64,
    pub status: SpanStatus,
    pub attributes: BTreeMap<String, AttrValue>,
}

/// A span that is still open, exclusively owned by the request task that
/// created it. Closing hands the record to the recorder; if the task is
/// dropped first, `Drop` closes the span with an error status.
#[derive(Debug)]
pub struct ActiveSpan {
    recorder: Arc<SpanRecorder>,
    context: TraceContext,
    name: String,
    started_wall: SystemTime,
    started: Instant,
    attributes: BTreeMap<String, AttrValue>,
    error: bool,
    ended: bool,
}

impl ActiveSpan {
    pub(crate) fn new(recorder: Arc<SpanRecorder>, context: TraceContext, name: String) -> Self {
        Self {
            recorder,
            context,
            name,
            started_wall: SystemTime::now(),
            started: Instant::now(),
            attributes: BTreeMap::new(),
            error: false,
            ended: false,
        }
    }

    /// The propagated context of this span. Inject this before calling
    /// downstream so the callee's span links here.
    pub fn context(&self) -> TraceContext {
        self.context
    }

    /// Add or overwrite an attribute. Idempotent per key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        if self.ended {
            debug_assert!(false, "attribute set on ended span");
            tracing::warn!(span_id = %self.context.span_id, "attribute set on ended span, ignored");
            return;
        }
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Record a failure message and flag the span as errored. The span stays
    /// open; status is fixed at `end`.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set_attribute("error", message.into());
        self.error = true;
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Close the span. A second call is ignored in release builds and fails
    /// a debug assertion in debug builds.
    pub fn end(&mut self, status: SpanStatus) {
        if self.ended {
            debug_assert!(false, "span ended twice");
            tracing::warn!(span_id = %self.context.span_id, "span ended twice, ignored");
            return;
        }
        self.finish(status);
    }

    fn finish(&mut self, status: SpanStatus) {
        self.ended = true;
        let record = SpanRecord {
            service: self.recorder.service().to_string(),
            name: std::mem::take(&mut self.name),
            trace_id: self.context.trace_id,
            span_id: self.context.span_id,
            parent_span_id: self.context.parent_span_id,
            sampled: self.context.sampled,
            start_unix_nanos: self
                .started_wall
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0),
            duration_micros: self.started.elapsed().as_micros() as u64,
            status,
            attributes: std::mem::take(&mut self.attributes),
        };
        self.recorder.finish(record);
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        if !self.ended {
            // The owning task was cancelled before responding.
            self.attributes
                .entry("error".to_string())
                .or_insert_with(|| AttrValue::from("client-disconnected"));
            self.finish(SpanStatus::Error);
        }
    }
}

/// Clonable handle to the request's active span.
///
/// The inbound middleware owns the span lifecycle but the handler body needs
/// to attach attributes and record downstream failures, so both sides of one
/// request task share it through request extensions. Once ended the cell is
/// empty and later calls are no-ops.
#[derive(Debug, Clone)]
pub struct SharedSpan {
    inner: Arc<Mutex<Option<ActiveSpan>>>,
}

impl SharedSpan {
    pub fn new(span: ActiveSpan) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(span))),
        }
    }

    pub fn context(&self) -> Option<TraceContext> {
        self.inner.lock().unwrap().as_ref().map(|s| s.context())
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<AttrValue>) {
        if let Some(span) = self.inner.lock().unwrap().as_mut() {
            span.set_attribute(key, value);
        }
    }

    pub fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|s| s.attribute(key).cloned())
    }

    pub fn set_error(&self, message: impl Into<String>) {
        if let Some(span) = self.inner.lock().unwrap().as_mut() {
            span.set_error(message);
        }
    }

    pub fn has_error(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.has_error())
            .unwrap_or(false)
    }

    /// Close the span and empty the cell. Later calls through any clone of
    /// this handle are no-ops.
    pub fn end(&self, status: SpanStatus) {
        if let Some(mut span) = self.inner.lock().unwrap().take() {
            span.end(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::export::InMemoryExporter;

    fn recorder_with_sink() -> (Arc<SpanRecorder>, InMemoryExporter) {
        let sink = InMemoryExporter::new();
        let recorder =
            Arc::new(SpanRecorder::new("test-service").with_exporter(Box::new(sink.clone())));
        (recorder, sink)
    }

    #[test]
    fn test_end_exports_record_once() {
        let (recorder, sink) = recorder_with_sink();
        let mut span = recorder.start_span("GET /", None);
        span.set_attribute("http.method", "GET");
        span.end(SpanStatus::Ok);
        drop(span);

        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "GET /");
        assert_eq!(spans[0].status, SpanStatus::Ok);
        assert_eq!(spans[0].attributes.get("http.method"), Some(&AttrValue::from("GET")));
    }

    #[test]
    fn test_attribute_overwrite_is_idempotent() {
        let (recorder, sink) = recorder_with_sink();
        let mut span = recorder.start_span("op", None);
        span.set_attribute("key", "first");
        span.set_attribute("key", "second");
        span.end(SpanStatus::Ok);

        assert_eq!(sink.spans()[0].attributes.get("key"), Some(&AttrValue::from("second")));
    }

    #[test]
    fn test_drop_without_end_records_disconnect() {
        let (recorder, sink) = recorder_with_sink();
        let span = recorder.start_span("GET /slow", None);
        drop(span);

        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert_eq!(
            spans[0].attributes.get("error"),
            Some(&AttrValue::from("client-disconnected"))
        );
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "span ended twice")]
    fn test_double_end_fails_loudly_in_debug() {
        let (recorder, _sink) = recorder_with_sink();
        let mut span = recorder.start_span("op", None);
        span.end(SpanStatus::Ok);
        span.end(SpanStatus::Ok);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "attribute set on ended span")]
    fn test_attribute_after_end_fails_loudly_in_debug() {
        let (recorder, _sink) = recorder_with_sink();
        let mut span = recorder.start_span("op", None);
        span.end(SpanStatus::Ok);
        span.set_attribute("late", true);
    }

    #[test]
    fn test_shared_span_end_is_terminal() {
        let (recorder, sink) = recorder_with_sink();
        let shared = SharedSpan::new(recorder.start_span("GET /", None));
        let other = shared.clone();

        shared.end(SpanStatus::Ok);
        // The cell is empty now; these must not panic or export again.
        other.end(SpanStatus::Error);
        other.set_attribute("late", true);
        assert!(other.context().is_none());

        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, SpanStatus::Ok);
    }
}
