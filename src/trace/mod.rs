//! Trace propagation and span recording subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → propagation.rs (extract parent context, or none → new trace root)
//!     → recorder.rs (start span, inherit trace id / link parent)
//!     → span.rs (attributes, status, close exactly once on every exit path)
//!     → export.rs (closed record offered to each exporter, fire-and-forget)
//!
//! Outbound request headers
//!     ← propagation.rs (inject current span's context)
//! ```
//!
//! # Design Decisions
//! - No process-wide tracer: the recorder is built once in main and passed
//!   by reference through application state
//! - Carrier format is W3C `traceparent`; malformed input means "no context"
//! - Exporter failures are logged and dropped, never surfaced to a request

pub mod context;
pub mod export;
pub mod propagation;
pub mod recorder;
pub mod span;

pub use context::{SpanId, TraceContext, TraceId};
pub use export::{ConsoleExporter, InMemoryExporter, OtlpHttpExporter, SpanExporter};
pub use recorder::SpanRecorder;
pub use span::{ActiveSpan, AttrValue, SharedSpan, SpanRecord, SpanStatus};
