//! Flap Relay - Binary Entry Point
//!
//! Serves the WebSocket binding at `/ws` and the SSE + polling binding at
//! `/api/connect` on one listener.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use anyhow::{ensure, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flap_relay::config::{RelayConfig, DEFAULT_HOST, DEFAULT_PORT};
use flap_relay::{create_router, RelayServer};

/// Real-time relay between phone controllers and game displays
#[derive(Debug, Parser)]
#[command(name = "flap-relay", version)]
struct Cli {
    /// Interface to bind to: an IP literal or a resolvable host name
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT, env = "PORT")]
    port: u16,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RelayConfig> {
        ensure!(!self.host.trim().is_empty(), "bind host must not be empty");
        let bind_addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("invalid bind address: '{}' port {}", self.host, self.port))?
            .next()
            .with_context(|| format!("bind host '{}' resolved to no addresses", self.host))?;
        Ok(RelayConfig::new(bind_addr))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;
    let bind_addr = config.bind_addr;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    let relay = RelayServer::start(config);
    let app = create_router(Arc::clone(&relay));

    info!("Relay listening on {}", bind_addr);
    info!("WebSocket endpoint: ws://{}/ws", bind_addr);
    info!("Event stream + commands: http://{}/api/connect", bind_addr);

    let shutdown_relay = Arc::clone(&relay);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!("Shutting down relay...");
        shutdown_relay.shutdown();
    })
    .await
    .context("server error")?;

    info!("Relay stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
