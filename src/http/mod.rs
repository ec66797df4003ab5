//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection
//!     → server.rs (Axum setup, timeouts, graceful shutdown)
//!     → middleware.rs (request ID, extract trace context, start span)
//!     → handlers.rs (route body; fan-out routes call downstream)
//!     → middleware.rs (end span from outcome, respond)
//! ```
//!
//! Every request reaches span end on every exit path: the middleware ends
//! the span after the handler returns, and if the request task is cancelled
//! first the span handle's `Drop` closes it as a client disconnect.

pub mod handlers;
pub mod middleware;
pub mod server;

pub use middleware::RequestId;
pub use server::{AppState, HttpServer};
