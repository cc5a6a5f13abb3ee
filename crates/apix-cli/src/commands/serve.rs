//! `apix serve` -- run the HTTP gateway.
//!
//! Loads the configuration, reports any problems it has, wires the
//! orchestrator to the shared HTTP client and serves until Ctrl+C.
//!
//! ```text
//! apix serve
//! apix serve --config /etc/apix/config.toml --port 9000
//! ```

use std::sync::Arc;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use apix_core::Orchestrator;
use apix_core::pipeline::HttpServiceInvoker;
use apix_platform::fs::NativeFileSystem;
use apix_platform::{NativePlatform, Platform};
use apix_services::api::{self, GatewayState};
use apix_types::config::Config;

use super::load_config;

/// Arguments for the `apix serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,

    /// Bind address (overrides `gateway.host`).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides `gateway.port`).
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Apply command-line listener overrides to the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.gateway.host = host.clone();
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
}

/// Run the gateway until interrupted.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    info!("starting apix gateway");

    let platform = NativePlatform::new();
    let mut config = load_config(&platform, args.config.as_deref()).await?;
    apply_overrides(&mut config, &args);

    for issue in config.validate() {
        warn!(severity = ?issue.severity, "{}", issue.message);
    }

    let invoker = Arc::new(HttpServiceInvoker::new(platform.shared_http()));
    let orchestrator = Arc::new(Orchestrator::from_config(&config, invoker));
    info!(
        routes = orchestrator.routes().len(),
        extensions = orchestrator.registry().len(),
        "pipeline configured"
    );

    let shutdown = CancellationToken::new();
    let state = GatewayState::from_config(
        &config,
        orchestrator,
        Arc::new(NativeFileSystem),
        shutdown.clone(),
    );
    let router = api::build_router(state, &config.gateway);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => warn!(error = %e, "failed to listen for Ctrl+C, shutting down"),
        }
        signal.cancel();
    });

    api::serve(router, &config.gateway, shutdown).await?;
    info!("apix gateway stopped");
    Ok(())
}
