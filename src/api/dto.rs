//! Data Transfer Objects
//!
//! Response types for the HTTP endpoints.

use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy
    pub status: String,
    /// Registered rooms, empty ones included
    pub rooms: usize,
    /// Rooms with at least one participant
    pub occupied_rooms: usize,
    /// Rooms holding two participants
    pub full_rooms: usize,
    /// Participants joined to a room
    pub joined: usize,
    /// Open WebSocket connections
    pub connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
