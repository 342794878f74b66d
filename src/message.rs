//! Message protocol definitions
//!
//! JSON-based bidirectional protocol. Every frame is an envelope
//! `{"event": <name>, "data": <payload>}`, decoded once into a closed enum
//! with Serde's adjacent tagging.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::RoomError;

/// Display name shown on server-generated chat lines
pub const SYSTEM_NAME: &str = "System";

/// Longest display name kept, in characters
pub const MAX_NAME_CHARS: usize = 32;

/// Client → Server message
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Create a new room and become its host
    CreateRoom { name: String },
    /// Join an existing room by code
    JoinRoom { room: String, name: String },
    /// Send a chat message to a room
    ChatMessage { text: String, room: String },
    /// Leave a room (payload is the room code)
    LeaveRoom(String),
    /// Close a room you host (payload is the room code)
    CloseRoom(String),
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Connection accepted, client ID issued
    Connected {
        #[serde(rename = "clientId")]
        client_id: String,
    },
    /// Room created; sender is the host
    RoomCreated { code: String },
    /// Room joined successfully
    RoomJoined { code: String },
    /// A room operation was refused
    JoinError { message: String },
    /// Chat line, from a member or from the server
    ChatMessage(ChatPayload),
    /// The room is going away
    RoomClosed { room: String, message: String },
    /// Acknowledgment to the host that closed the room
    RoomClosedByHost,
    /// Undecodable frame
    Error { message: String },
}

/// Chat line payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPayload {
    pub name: String,
    pub text: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChatKind>,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    System,
}

impl ServerMessage {
    /// Chat line from a member
    pub fn chat(name: String, text: String) -> Self {
        ServerMessage::ChatMessage(ChatPayload {
            name,
            text,
            kind: None,
            timestamp: now_millis(),
        })
    }

    /// Server-generated notice shown inline in the chat
    pub fn system(text: String) -> Self {
        ServerMessage::ChatMessage(ChatPayload {
            name: SYSTEM_NAME.to_string(),
            text,
            kind: Some(ChatKind::System),
            timestamp: now_millis(),
        })
    }
}

/// Convert RoomError to ServerMessage for client notification
impl From<RoomError> for ServerMessage {
    fn from(err: RoomError) -> Self {
        ServerMessage::JoinError {
            message: err.to_string(),
        }
    }
}

/// Trim a client-supplied display name and cap its length
pub fn clean_name(raw: &str) -> Result<String, RoomError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RoomError::InvalidName);
    }
    Ok(name.chars().take(MAX_NAME_CHARS).collect())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
