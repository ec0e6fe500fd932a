//! Chat relay - Entry point
//!
//! Binds one listener per port given on the command line and serves
//! until SIGINT or SIGTERM.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{PortListener, RelayConfig, RelayError};

fn parse_ports(args: impl Iterator<Item = String>) -> Result<Vec<u16>, RelayError> {
    args.map(|arg| {
        arg.parse::<u16>()
            .map_err(|_| RelayError::InvalidPort(arg.clone()))
    })
    .collect()
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let ports = match parse_ports(env::args().skip(1)) {
        Ok(ports) if !ports.is_empty() => ports,
        Ok(_) => {
            eprintln!("Usage: chat-relay <port> [<port> ...]");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: chat-relay <port> [<port> ...]");
            return ExitCode::FAILURE;
        }
    };

    let config = Arc::new(RelayConfig::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut listeners = Vec::with_capacity(ports.len());

    // Bind every port before serving any of them.
    for port in ports {
        let listener = match PortListener::bind(port, Arc::clone(&config)).await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("failed to bind port {port}: {e}");
                return ExitCode::FAILURE;
            }
        };
        info!("listening on port {}", port);
        listeners.push(tokio::spawn(listener.run(shutdown_rx.clone())));
    }

    shutdown_signal().await;
    info!("shutdown signal received, stopping listeners");
    shutdown_tx.send_replace(true);

    for listener in listeners {
        let _ = listener.await;
    }

    ExitCode::SUCCESS
}
