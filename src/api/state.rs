//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::signaling::{RoomRegistry, RoutePolicy, Router};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Room registry, owned here and torn down on shutdown
    pub registry: Arc<RoomRegistry>,
    /// Signaling router over the registry
    pub router: Router,
    /// Application configuration
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Permits for concurrent WebSocket connections
    pub connection_slots: Arc<Semaphore>,
}

impl AppState {
    /// Create a new AppState with an empty registry
    pub fn new(config: Config) -> Self {
        Self::with_registry(Arc::new(RoomRegistry::new()), config)
    }

    /// Create AppState around an existing registry
    pub fn with_registry(registry: Arc<RoomRegistry>, config: Config) -> Self {
        let router = Router::new(Arc::clone(&registry), RoutePolicy::from(&config.rooms));
        let connection_slots = Arc::new(Semaphore::new(config.server.connection_limit()));

        Self {
            registry,
            router,
            config: Arc::new(config),
            start_time: Instant::now(),
            connection_slots,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get the number of open WebSocket connections, joined or not
    pub fn open_connections(&self) -> usize {
        self.config
            .server
            .connection_limit()
            .saturating_sub(self.connection_slots.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_connection_limit_is_clamped() {
        let mut config = Config::default();
        config.server.max_connections = usize::MAX;

        let state = AppState::new(config);
        assert_eq!(
            state.connection_slots.available_permits(),
            Semaphore::MAX_PERMITS
        );
        assert_eq!(state.open_connections(), 0);
    }
}
