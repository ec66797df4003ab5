//! Traced demo service.
//!
//! One process serves one instance of a small HTTP mesh and exports one span
//! per inbound request.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                SERVICE INSTANCE                 │
//!   Client Request    │  ┌──────────┐   ┌──────────┐   ┌────────────┐  │
//!   ──────────────────┼─▶│  http    │──▶│  trace   │──▶│  handlers  │  │
//!                     │  │ server   │   │ middleware│  │            │  │
//!                     │  └──────────┘   └──────────┘   └─────┬──────┘  │
//!                     │                                      │         │
//!                     │                                      ▼         │
//!                     │                               ┌────────────┐   │     Downstream
//!                     │                               │   fanout   │───┼──▶  Service
//!                     │                               │orchestrator│   │     (traceparent
//!                     │                               └────────────┘   │      injected)
//!                     │  ┌────────────────────────────────────────┐    │
//!                     │  │ trace recorder → console / OTLP export │    │
//!                     │  └────────────────────────────────────────┘    │
//!                     └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use traced_service::config::{load_config, ServiceConfig};
use traced_service::http::HttpServer;
use traced_service::lifecycle::Shutdown;
use traced_service::trace::{ConsoleExporter, OtlpHttpExporter, SpanRecorder};

#[derive(Parser)]
#[command(name = "traced-service", about = "Traced demo service instance", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the service name from config.
    #[arg(long)]
    service: Option<String>,

    /// Override the listen address from config.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "traced_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(service) = cli.service {
        config.service.name = service;
    }
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
    }

    tracing::info!(
        service = %config.service.name,
        bind_address = %config.listener.bind_address,
        downstreams = config.downstreams.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let mut recorder = SpanRecorder::new(config.service.name.clone());
    if config.tracing.console_enabled {
        recorder = recorder.with_exporter(Box::new(ConsoleExporter));
    }
    if config.tracing.otlp_enabled {
        let endpoint = config.tracing.resolved_endpoint();
        match OtlpHttpExporter::new(&endpoint) {
            Ok(exporter) => {
                tracing::info!(endpoint = %endpoint, "span export to tracing backend enabled");
                recorder = recorder.with_exporter(Box::new(exporter));
            }
            Err(error) => {
                tracing::error!(endpoint = %endpoint, %error, "disabling backend span export");
            }
        }
    }
    let recorder = Arc::new(recorder);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, recorder);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
