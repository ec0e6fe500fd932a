//! Line-oriented TCP chat relay library
//!
//! A multi-port chat relay built on tokio: clients connect over plain
//! TCP, send newline-terminated lines, and every line is broadcast to
//! all clients on the same port. New joiners receive a backlog of up to
//! 100 recent lines before any live traffic.
//!
//! # Architecture
//! One `Room` per listening port holds the membership set and the
//! bounded backlog. Each accepted connection becomes a `Session` running
//! two tasks: a read duty (socket lines → `Room::broadcast`) and a write
//! duty (outbound queue → socket). The room only knows its members
//! through the `Participant` trait, so it never touches socket details.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::sync::watch;
//! use chat_relay::{PortListener, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(RelayConfig::default());
//!     let listener = PortListener::bind(8080, config).await?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     listener.run(shutdown_rx).await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod participant;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::RelayConfig;
pub use error::RelayError;
pub use participant::Participant;
pub use room::Room;
pub use server::PortListener;
pub use session::Session;
pub use types::SessionId;
