//! `whoami`: tailnet identity service entry point.
//!
//! Startup sequence:
//! 1. Parse flags and load [`Config`] from the environment.
//! 2. Initialise structured logging.
//! 3. Query the local tailscaled for this node's status; failure is fatal.
//! 4. Build the Axum router and start the TLS server.

mod cli;
mod config;
mod cors;
mod server;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use localapi::{LocalClient, Tailnet};
use tracing::info;

use cli::Args;
use config::{Config, ListenAddr};
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let args = Args::parse();
    let cfg = Config::load(args).map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %cfg.listen,
        allowed_origins = %cfg.allowed_origins,
        socket = %cfg.socket.display(),
        "whoami starting"
    );

    // -----------------------------------------------------------------------
    // 3. Local tailscaled
    // -----------------------------------------------------------------------
    let client = LocalClient::new(&cfg.socket);
    let status = client
        .status()
        .await
        .context("failed to query tailscaled status")?;
    let hostname = status.self_dns_name().to_owned();

    // -----------------------------------------------------------------------
    // 4. HTTPS server
    // -----------------------------------------------------------------------
    let tailnet: Arc<dyn Tailnet> = Arc::new(client);
    let state = AppState::new(cfg.allowed_origins.clone(), Arc::clone(&tailnet));
    let router = server::router::build(state);

    let listener = tokio::net::TcpListener::bind(cfg.listen.addr)
        .await
        .with_context(|| format!("failed to listen on {}", cfg.listen))?;
    info!(
        hostname = %hostname,
        address = %cfg.listen,
        backend_state = %status.backend_state,
        "{}",
        listening_message(&hostname, &cfg.listen)
    );

    server::serve::run(listener, router, tailnet, server::serve::shutdown_signal()).await
}

/// Startup line: the node's DNS name followed by the address as configured.
fn listening_message(hostname: &str, listen: &ListenAddr) -> String {
    format!("Listening on {hostname}{listen}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listening_message_keeps_address_as_given() {
        let port_only = ListenAddr::parse(":8080").unwrap();
        assert_eq!(
            listening_message("node.example.ts.net", &port_only),
            "Listening on node.example.ts.net:8080"
        );

        let explicit = ListenAddr::parse("127.0.0.1:8443").unwrap();
        assert_eq!(
            listening_message("node.example.ts.net", &explicit),
            "Listening on node.example.ts.net127.0.0.1:8443"
        );
    }
}
