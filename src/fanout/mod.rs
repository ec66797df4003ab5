//! Downstream fan-out subsystem.
//!
//! # Data Flow
//! ```text
//! Handler with downstream work:
//!     → discovery.rs (logical service name → address, or default fallback)
//!     → orchestrator.rs (inject span context, sequence calls, catch failures)
//!     → transport.rs (actual HTTP GET with per-call timeout)
//!
//! On failure:
//!     orchestrator marks the handler span ERROR, records the message,
//!     and the handler degrades to a structured 500 response.
//! ```
//!
//! # Design Decisions
//! - Calls are awaited sequentially; no parallel fan-out
//! - A timeout is just another downstream failure
//! - Downstream failures never crash the process or escape as raw errors

pub mod discovery;
pub mod orchestrator;
pub mod transport;

pub use discovery::{ServiceDiscovery, StaticDiscovery};
pub use orchestrator::{DownstreamError, FanoutOrchestrator, FanoutTarget};
pub use transport::{DownstreamReply, DownstreamTransport, HttpTransport, TransportError};
