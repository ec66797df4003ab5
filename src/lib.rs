//! Traced Demo Service Library
//!
//! One binary runs one instance of a small HTTP mesh. Every inbound request
//! maps to exactly one span; fan-out routes call downstream peers with the
//! current span's context injected as a `traceparent` header, so handler
//! spans across services link into one trace.

pub mod config;
pub mod fanout;
pub mod http;
pub mod lifecycle;
pub mod trace;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use trace::{SpanRecorder, TraceContext};
