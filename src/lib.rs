//! # Signal Relay
//!
//! Rendezvous and signaling relay for one-to-one peer connections.
//!
//! Two peers join the same room over a WebSocket, learn each other's uid,
//! then exchange offers, answers and network candidates through the relay.
//! The relay never carries media and never reads negotiation payloads.
//!
//! ## Modules
//!
//! - [`signaling`]: rooms, routing and the per-connection state machine
//! - [`api`]: Axum router, health endpoints and server lifecycle
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signal_relay::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(Config::default());
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod signaling;

// Re-export top-level types for convenience
pub use api::{build_router, serve, serve_on, ApiError, AppState};

pub use config::{
    generate_default_config, Config, ConfigError, LoadReport, LoggingConfig, RoomsConfig,
    ServerConfig,
};

pub use signaling::{
    websocket_handler, ClientMessage, ConnectionHandle, JoinOutcome, LeaveOutcome,
    RegistryStats, Room, RoomRegistry, RouteError, RoutePolicy, Router, ServerMessage, Session,
    SessionError, SessionState, ROOM_CAPACITY,
};
