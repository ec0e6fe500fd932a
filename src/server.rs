//! Per-port listener
//!
//! Each configured port gets its own listener and its own room; ports
//! never share state. The accept loop spawns a session per connection
//! and keeps accepting immediately.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::room::Room;
use crate::session::Session;

/// One listening socket bound to one room.
pub struct PortListener {
    listener: TcpListener,
    room: Arc<Room>,
    config: Arc<RelayConfig>,
}

impl PortListener {
    /// Bind the port and create its room. Bind failure is a startup
    /// error and propagates to the caller.
    pub async fn bind(port: u16, config: Arc<RelayConfig>) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let room = Arc::new(Room::new(config.max_backlog));
        Ok(Self {
            listener,
            room,
            config,
        })
    }

    /// The bound address (resolves port 0 under test)
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// The room every connection on this port joins
    pub fn room(&self) -> Arc<Room> {
        Arc::clone(&self.room)
    }

    /// Accept connections until the shutdown signal flips.
    ///
    /// Accept errors are treated as transient: logged, loop continues.
    /// A session's lifetime never blocks the accept loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let port = self
            .listener
            .local_addr()
            .map(|a| a.port())
            .unwrap_or_default();

        loop {
            tokio::select! {
                _ = shutdown.wait_for(|stopping| *stopping) => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        info!("new connection from {} on port {}", addr, port);
                        Session::spawn(stream, self.room(), &self.config);
                    }
                    Err(e) => {
                        error!("failed to accept connection on port {}: {}", port, e);
                    }
                }
            }
        }

        info!("listener on port {} stopped", port);
    }
}
