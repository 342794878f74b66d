//! Room struct definition
//!
//! Represents a chat room: one host, a roster of named members,
//! and the room's position in its cleanup lifecycle.

use std::collections::HashMap;
use std::time::Instant;

use crate::error::RoomError;
use crate::types::ClientId;

/// Default room capacity, host included
pub const MAX_MEMBERS: usize = 10;

/// Lifecycle state of a room
///
/// `Closing` and `PendingEmpty` carry the ticket of the deletion that was
/// armed when the room entered that state. A scheduled deletion only acts
/// if the room still holds its ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Normal operation
    Active,
    /// Closed by (or lost) its host; deleted unconditionally when the ticket fires
    Closing { ticket: u64 },
    /// Last member disconnected; deleted only if still empty when the ticket fires
    PendingEmpty { ticket: u64 },
}

/// Chat room
///
/// The host stays a member from creation until it leaves or disconnects.
/// There is no host handoff: a room whose host left keeps running
/// without one and can no longer be closed, only emptied.
#[derive(Debug)]
pub struct Room {
    /// Room creator (host)
    pub host: ClientId,
    /// Member roster: connection -> display name
    pub members: HashMap<ClientId, String>,
    /// Room creation time
    pub created_at: Instant,
    /// Cleanup lifecycle state
    pub state: RoomState,
}

impl Room {
    /// Create a new room with the host as its only member
    pub fn new(host: ClientId, host_name: String) -> Self {
        let mut members = HashMap::new();
        members.insert(host, host_name);
        Self {
            host,
            members,
            created_at: Instant::now(),
            state: RoomState::Active,
        }
    }

    pub fn is_host(&self, client_id: ClientId) -> bool {
        self.host == client_id
    }

    pub fn is_closing(&self) -> bool {
        matches!(self.state, RoomState::Closing { .. })
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.members.len() >= capacity
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a client is in this room
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains_key(&client_id)
    }

    /// Registered display name of a member
    pub fn member_name(&self, client_id: ClientId) -> Option<&str> {
        self.members.get(&client_id).map(String::as_str)
    }

    /// Add a member, enforcing capacity and uniqueness
    ///
    /// A room waiting out its empty-room grace period becomes active again.
    pub fn add_member(
        &mut self,
        client_id: ClientId,
        name: String,
        capacity: usize,
    ) -> Result<(), RoomError> {
        if self.is_full(capacity) {
            return Err(RoomError::RoomFull);
        }
        if self.contains(client_id) {
            return Err(RoomError::AlreadyMember);
        }
        self.members.insert(client_id, name);
        if matches!(self.state, RoomState::PendingEmpty { .. }) {
            self.state = RoomState::Active;
        }
        Ok(())
    }

    /// Remove a member, returning their display name if they were present
    pub fn remove_member(&mut self, client_id: ClientId) -> Option<String> {
        self.members.remove(&client_id)
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
