//! Room registry
//!
//! Single source of truth for which rooms exist. Every room is created and
//! removed here, and every operation is a read-then-write on plain owned
//! state; exclusivity comes from the registry living inside the server actor.
//!
//! Operations report what happened instead of notifying anyone. The server
//! turns those outcomes into outbound events and scheduled deletions.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::RoomError;
use crate::room::{Room, RoomState, MAX_MEMBERS};
use crate::types::{ClientId, RoomCode};

/// Why a deletion was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupKind {
    /// Explicit close or host disconnect: delete unconditionally
    Close,
    /// Last member disconnected: delete only if still empty
    Empty,
}

/// A deletion the caller must schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleanup {
    pub code: RoomCode,
    pub ticket: u64,
    pub kind: CleanupKind,
}

/// Successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub code: RoomCode,
    pub name: String,
}

/// Result of a voluntary leave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub name: String,
    /// True if the room was deleted because it became empty
    pub room_deleted: bool,
    /// True if the room was already closing (no notices go out)
    pub was_closing: bool,
}

/// A message accepted for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub name: String,
    pub text: String,
}

/// What a disconnect did to one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectEffect {
    /// The host disconnected; the room is closing
    HostGone { code: RoomCode, cleanup: Cleanup },
    /// A member disconnected; `cleanup` is set if the room is now empty
    MemberGone {
        code: RoomCode,
        name: String,
        cleanup: Option<Cleanup>,
    },
}

/// Room registry: RoomCode -> Room
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    capacity: usize,
    next_ticket: u64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(MAX_MEMBERS)
    }
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            capacity,
            next_ticket: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Look up a room; the code is matched case-insensitively
    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(&RoomCode::from_string(code))
    }

    /// Create a room hosted by `host` and return its code
    ///
    /// Code generation and insertion happen in the same call, so no other
    /// create can claim the code in between.
    pub fn create(&mut self, host: ClientId, host_name: String) -> RoomCode {
        let code = RoomCode::generate_unique(|c| self.rooms.contains_key(c));
        let room = Room::new(host, host_name);
        self.rooms.insert(code.clone(), room);

        info!("Client {} created room {}", host, code);
        debug!("Total rooms: {}", self.rooms.len());
        code
    }

    /// Add `client_id` to the room as `name`
    pub fn join(
        &mut self,
        code: &RoomCode,
        client_id: ClientId,
        name: String,
    ) -> Result<Joined, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .filter(|room| !room.is_closing())
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;

        room.add_member(client_id, name.clone(), self.capacity)?;
        info!(
            "Client {} joined room {} ({} members)",
            client_id,
            code,
            room.member_count()
        );

        Ok(Joined {
            code: code.clone(),
            name,
        })
    }

    /// Remove `client_id` from the room, deleting the room if it empties
    ///
    /// Returns None if the room does not exist or the client is not in it.
    pub fn leave(&mut self, code: &RoomCode, client_id: ClientId) -> Option<Departure> {
        let room = self.rooms.get_mut(code)?;
        let name = room.remove_member(client_id)?;
        let was_closing = room.is_closing();
        let room_deleted = room.is_empty();

        info!("Client {} left room {}", client_id, code);
        if room_deleted {
            self.rooms.remove(code);
            info!("Room {} deleted (empty)", code);
        }

        Some(Departure {
            name,
            room_deleted,
            was_closing,
        })
    }

    /// Close a room on behalf of its host
    ///
    /// Only a host that is still a member may close. The room stays registered until the returned cleanup fires, so members
    /// can still be reached with the closing notice.
    pub fn close(&mut self, code: &RoomCode, requester: ClientId) -> Result<Cleanup, RoomError> {
        let ticket = self.next_ticket;
        let room = self
            .rooms
            .get_mut(code)
            .filter(|room| !room.is_closing())
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;

        if !room.is_host(requester) || !room.contains(requester) {
            return Err(RoomError::NotHost);
        }

        room.state = RoomState::Closing { ticket };
        self.next_ticket += 1;
        info!("Room {} closed by host {}", code, requester);

        Ok(Cleanup {
            code: code.clone(),
            ticket,
            kind: CleanupKind::Close,
        })
    }

    /// Resolve the sender's display name for a chat message
    ///
    /// Returns None (drop silently) if the room is gone or closing, or the
    /// sender is not a member.
    pub fn post_message(&self, code: &RoomCode, client_id: ClientId, text: String) -> Option<Posted> {
        let room = self.rooms.get(code).filter(|room| !room.is_closing())?;
        let name = room.member_name(client_id)?.to_string();
        Some(Posted { name, text })
    }

    /// Apply a connection's departure to every room it belongs to
    pub fn disconnect(&mut self, client_id: ClientId) -> Vec<DisconnectEffect> {
        let mut effects = Vec::new();

        for (code, room) in self.rooms.iter_mut() {
            if !room.contains(client_id) {
                continue;
            }

            if room.is_closing() {
                // Deletion is already armed
                room.remove_member(client_id);
                continue;
            }

            if room.is_host(client_id) {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                room.state = RoomState::Closing { ticket };
                info!("Host {} of room {} disconnected", client_id, code);

                effects.push(DisconnectEffect::HostGone {
                    code: code.clone(),
                    cleanup: Cleanup {
                        code: code.clone(),
                        ticket,
                        kind: CleanupKind::Close,
                    },
                });
                continue;
            }

            let Some(name) = room.remove_member(client_id) else {
                continue;
            };
            info!("Client {} disconnected from room {}", client_id, code);

            let cleanup = if room.is_empty() {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                room.state = RoomState::PendingEmpty { ticket };
                debug!("Room {} is empty, pending deletion", code);
                Some(Cleanup {
                    code: code.clone(),
                    ticket,
                    kind: CleanupKind::Empty,
                })
            } else {
                None
            };

            effects.push(DisconnectEffect::MemberGone {
                code: code.clone(),
                name,
                cleanup,
            });
        }

        effects
    }

    /// Run a scheduled deletion
    ///
    /// Deletes only if the room still holds the ticket the cleanup was armed
    /// with (and, for empty-room cleanups, is still empty). Safe to call for
    /// rooms that are already gone. Returns true if a room was removed.
    pub fn expire(&mut self, cleanup: &Cleanup) -> bool {
        let Some(room) = self.rooms.get(&cleanup.code) else {
            debug!("Cleanup for {} skipped: room already gone", cleanup.code);
            return false;
        };

        let due = match (cleanup.kind, room.state) {
            (CleanupKind::Close, RoomState::Closing { ticket }) => ticket == cleanup.ticket,
            (CleanupKind::Empty, RoomState::PendingEmpty { ticket }) => {
                ticket == cleanup.ticket && room.is_empty()
            }
            _ => false,
        };

        if !due {
            debug!("Cleanup for {} skipped: room changed", cleanup.code);
            return false;
        }

        info!(
            "Room {} deleted ({:?}) after {:?}",
            cleanup.code,
            cleanup.kind,
            room.created_at.elapsed()
        );
        self.rooms.remove(&cleanup.code);
        debug!("Total rooms: {}", self.rooms.len());
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn registry_with_room() -> (RoomRegistry, RoomCode, ClientId) {
        let mut registry = RoomRegistry::default();
        let host = ClientId::new();
        let code = registry.create(host, "Alice".to_string());
        (registry, code, host)
    }

    #[test]
    fn test_create_distinct_codes() {
        let mut registry = RoomRegistry::default();
        let mut codes = HashSet::new();
        for _ in 0..500 {
            let code = registry.create(ClientId::new(), "host".to_string());
            assert!(code.is_well_formed());
            assert!(codes.insert(code));
        }
        assert_eq!(registry.len(), 500);
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let (registry, code, host) = registry_with_room();
        let lower = code.as_str().to_lowercase();

        let room = registry.get(&lower).unwrap();
        assert!(room.is_host(host));
        assert!(registry.get("ZZZZZZZ").is_none());
    }

    #[test]
    fn test_join_missing_room() {
        let mut registry = RoomRegistry::default();
        let code = RoomCode::from_string("nope00");

        let err = registry
            .join(&code, ClientId::new(), "Bob".to_string())
            .unwrap_err();
        assert_eq!(err, RoomError::RoomNotFound(code));
    }

    #[test]
    fn test_join_full_and_duplicate() {
        let (mut registry, code, host) = registry_with_room();
        for i in 1..MAX_MEMBERS {
            registry
                .join(&code, ClientId::new(), format!("guest{}", i))
                .unwrap();
        }

        let err = registry
            .join(&code, ClientId::new(), "late".to_string())
            .unwrap_err();
        assert_eq!(err, RoomError::RoomFull);

        let mut registry = RoomRegistry::new(3);
        let code = registry.create(host, "Alice".to_string());
        let err = registry.join(&code, host, "Alice".to_string()).unwrap_err();
        assert_eq!(err, RoomError::AlreadyMember);
    }

    #[test]
    fn test_leave_deletes_empty_room_immediately() {
        let (mut registry, code, host) = registry_with_room();
        let guest = ClientId::new();
        registry.join(&code, guest, "Bob".to_string()).unwrap();

        let departure = registry.leave(&code, guest).unwrap();
        assert_eq!(departure.name, "Bob");
        assert!(!departure.room_deleted);

        let departure = registry.leave(&code, host).unwrap();
        assert!(departure.room_deleted);
        assert!(registry.get(code.as_str()).is_none());
    }

    #[test]
    fn test_leave_unknown_is_noop() {
        let (mut registry, code, _) = registry_with_room();
        assert!(registry.leave(&code, ClientId::new()).is_none());
        assert!(registry
            .leave(&RoomCode::from_string("AAAAAA"), ClientId::new())
            .is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_close_requires_host() {
        let (mut registry, code, host) = registry_with_room();
        let guest = ClientId::new();
        registry.join(&code, guest, "Bob".to_string()).unwrap();

        assert_eq!(registry.close(&code, guest), Err(RoomError::NotHost));
        assert_eq!(registry.get(code.as_str()).unwrap().state, RoomState::Active);

        let cleanup = registry.close(&code, host).unwrap();
        assert_eq!(cleanup.kind, CleanupKind::Close);
        // Still registered until the cleanup fires
        assert!(registry.get(code.as_str()).unwrap().is_closing());

        assert!(registry.expire(&cleanup));
        assert!(registry.get(code.as_str()).is_none());
        // Idempotent
        assert!(!registry.expire(&cleanup));
    }

    #[test]
    fn test_departed_host_cannot_close() {
        let (mut registry, code, host) = registry_with_room();
        registry.join(&code, ClientId::new(), "Bob".to_string()).unwrap();
        registry.leave(&code, host).unwrap();

        assert_eq!(registry.close(&code, host), Err(RoomError::NotHost));
        assert_eq!(registry.get(code.as_str()).unwrap().state, RoomState::Active);
    }

    #[test]
    fn test_closing_room_rejects_join_and_chat() {
        let (mut registry, code, host) = registry_with_room();
        registry.close(&code, host).unwrap();

        let err = registry
            .join(&code, ClientId::new(), "Bob".to_string())
            .unwrap_err();
        assert_eq!(err, RoomError::RoomNotFound(code.clone()));
        assert!(registry.post_message(&code, host, "hi".to_string()).is_none());
    }

    #[test]
    fn test_post_message_uses_registered_name() {
        let (registry, code, host) = registry_with_room();

        let posted = registry
            .post_message(&code, host, "hello".to_string())
            .unwrap();
        assert_eq!(posted.name, "Alice");
        assert_eq!(posted.text, "hello");

        assert!(registry
            .post_message(&code, ClientId::new(), "spoof".to_string())
            .is_none());
    }

    #[test]
    fn test_host_disconnect_closes_room() {
        let (mut registry, code, host) = registry_with_room();
        registry.join(&code, ClientId::new(), "Bob".to_string()).unwrap();

        let effects = registry.disconnect(host);
        assert_eq!(effects.len(), 1);
        let DisconnectEffect::HostGone { cleanup, .. } = &effects[0] else {
            panic!("Wrong effect");
        };
        assert!(registry.get(code.as_str()).unwrap().is_closing());
        assert!(registry.expire(cleanup));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_member_disconnect_keeps_host_room() {
        let (mut registry, code, _) = registry_with_room();
        let guest = ClientId::new();
        registry.join(&code, guest, "Bob".to_string()).unwrap();

        let effects = registry.disconnect(guest);
        assert_eq!(
            effects,
            vec![DisconnectEffect::MemberGone {
                code: code.clone(),
                name: "Bob".to_string(),
                cleanup: None,
            }]
        );
        assert_eq!(registry.get(code.as_str()).unwrap().member_count(), 1);
    }

    #[test]
    fn test_last_member_disconnect_defers_deletion() {
        let (mut registry, code, host) = registry_with_room();
        let guest = ClientId::new();
        registry.join(&code, guest, "Bob".to_string()).unwrap();
        registry.leave(&code, host).unwrap();

        let effects = registry.disconnect(guest);
        let DisconnectEffect::MemberGone {
            cleanup: Some(cleanup),
            ..
        } = &effects[0]
        else {
            panic!("Expected an empty-room cleanup");
        };
        assert_eq!(cleanup.kind, CleanupKind::Empty);
        assert!(registry.get(code.as_str()).is_some());

        assert!(registry.expire(cleanup));
        assert!(registry.get(code.as_str()).is_none());
    }

    #[test]
    fn test_repopulated_room_survives_cleanup() {
        let (mut registry, code, host) = registry_with_room();
        let guest = ClientId::new();
        registry.join(&code, guest, "Bob".to_string()).unwrap();
        registry.leave(&code, host).unwrap();

        let effects = registry.disconnect(guest);
        let DisconnectEffect::MemberGone {
            cleanup: Some(stale),
            ..
        } = effects[0].clone()
        else {
            panic!("Expected an empty-room cleanup");
        };

        // Rejoin within the grace window, then empty the room again
        let carol = ClientId::new();
        registry.join(&code, carol, "Carol".to_string()).unwrap();
        assert!(!registry.expire(&stale));

        let effects = registry.disconnect(carol);
        let DisconnectEffect::MemberGone {
            cleanup: Some(fresh),
            ..
        } = effects[0].clone()
        else {
            panic!("Expected an empty-room cleanup");
        };

        // The first timer no longer matches; only the new one deletes
        assert!(!registry.expire(&stale));
        assert!(registry.expire(&fresh));
    }

    #[test]
    fn test_disconnect_spans_rooms() {
        let mut registry = RoomRegistry::default();
        let alice = ClientId::new();
        let bob = ClientId::new();
        let hosted = registry.create(bob, "Bob".to_string());
        let joined = registry.create(alice, "Alice".to_string());
        registry.join(&joined, bob, "Bob".to_string()).unwrap();

        let effects = registry.disconnect(bob);
        assert_eq!(effects.len(), 2);
        assert!(registry.get(hosted.as_str()).unwrap().is_closing());
        assert!(!registry.get(joined.as_str()).unwrap().contains(bob));
    }

    #[test]
    fn test_stale_close_does_not_touch_new_room() {
        let (mut registry, code, host) = registry_with_room();
        let cleanup = registry.close(&code, host).unwrap();
        registry.leave(&code, host).unwrap();
        assert!(registry.is_empty());

        // Simulate code reuse by a later room
        registry
            .rooms
            .insert(code.clone(), Room::new(host, "Alice".to_string()));
        assert!(!registry.expire(&cleanup));
        assert_eq!(registry.len(), 1);
    }
}
