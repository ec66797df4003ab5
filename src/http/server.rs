//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (trace hook, timeout, request logging)
//! - Construct the fan-out orchestrator from configuration
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::ServiceConfig;
use crate::fanout::{FanoutOrchestrator, FanoutTarget, HttpTransport, StaticDiscovery};
use crate::http::handlers;
use crate::http::middleware::trace_request;
use crate::trace::SpanRecorder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<SpanRecorder>,
    pub orchestrator: Arc<FanoutOrchestrator>,
    pub relay_targets: Arc<Vec<FanoutTarget>>,
    pub service_name: Arc<str>,
}

/// HTTP server for one service instance.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server. The recorder is built by the caller so its
    /// exporter list stays under the caller's control (tests register an
    /// in-memory exporter here).
    pub fn new(config: ServiceConfig, recorder: Arc<SpanRecorder>) -> Self {
        let transport = Arc::new(HttpTransport::new(Duration::from_secs(
            config.timeouts.downstream_secs,
        )));
        let discovery = Arc::new(StaticDiscovery::from_config(&config.downstreams));
        // Validated at load time; the default config parses too.
        let default_target =
            Url::parse(&format!("http://{}", config.fanout.default_downstream)).unwrap();
        let orchestrator = Arc::new(FanoutOrchestrator::new(transport, discovery, default_target));

        let state = AppState {
            recorder,
            orchestrator,
            relay_targets: Arc::new(config.fanout.targets.clone()),
            service_name: config.service.name.as_str().into(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/user/{id}", get(handlers::user))
            .route("/stat", get(handlers::stat))
            .route("/service-2", get(handlers::relay))
            .layer(from_fn_with_state(state.clone(), trace_request))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            service = %self.config.service.name,
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
