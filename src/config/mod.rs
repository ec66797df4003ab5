//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → consumed once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults so the binary runs with no config at all
//! - The tracing backend endpoint is the one env-sourced option, resolved
//!   during recorder initialization only

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DownstreamConfig, FanoutConfig, ListenerConfig, ServiceConfig, ServiceInfo, TimeoutConfig,
    TracingConfig, DEFAULT_OTLP_ENDPOINT, ENDPOINT_ENV,
};
