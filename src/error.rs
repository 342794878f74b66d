//! Error types for the relay
//!
//! Defines fatal per-connection errors, room operation errors,
//! and message send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::RoomCode;

/// Application-level errors
///
/// All of these are fatal for the connection (or the process, at startup).
/// Room-level failures live in [`RoomError`] and never end a connection.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Invalid configuration value
    #[error("Invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

/// Room operation errors
///
/// Returned by the registry to the session handler, which reports them
/// to the requesting connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// No live room with the given code
    #[error("Room {0} not found")]
    RoomNotFound(RoomCode),

    /// Room already holds the maximum number of members
    #[error("Room is full")]
    RoomFull,

    /// Connection is already a member of the room
    #[error("You are already in this room")]
    AlreadyMember,

    /// Only the host may close a room
    #[error("Only the host can close this room")]
    NotHost,

    /// Display name missing or blank
    #[error("A display name is required")]
    InvalidName,
}

/// Message send errors
///
/// Occurs when an outbound event cannot be queued for a connection.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The connection is not draining its queue fast enough
    #[error("Channel full")]
    ChannelFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_error_messages() {
        let err = RoomError::RoomNotFound(RoomCode::from_string("abc123"));
        assert_eq!(err.to_string(), "Room ABC123 not found");
        assert_eq!(RoomError::RoomFull.to_string(), "Room is full");
        assert_eq!(
            RoomError::NotHost.to_string(),
            "Only the host can close this room"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = AppError::Config {
            key: "ROOM_RELAY_ADDR",
            reason: "empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration for ROOM_RELAY_ADDR: empty"
        );
    }
}
