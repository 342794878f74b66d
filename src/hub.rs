//! Connection hub
//!
//! The server's only path to connections: per-connection delivery,
//! room subscription groups, and room-wide broadcast. A room's group
//! is independent of its roster so that a closing room can still be
//! reached until its deletion fires.
//!
//! Delivery never waits. A connection whose queue is full is dropped
//! from the hub, which closes its outbound channel and ends its socket,
//! and is queued for disconnect handling. A client that fell behind is
//! disconnected rather than left in a room with a gap in its stream.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, RoomCode};

#[derive(Debug, Default)]
pub struct Hub {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// Room subscription groups: RoomCode -> subscribers
    groups: HashMap<RoomCode, HashSet<ClientId>>,
    /// Clients dropped for falling behind, not yet removed from rooms
    evicted: Vec<ClientId>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_connected(&self, client_id: ClientId) -> bool {
        self.clients.contains_key(&client_id)
    }

    /// Start tracking a connection
    pub fn register(&mut self, client_id: ClientId, sender: mpsc::Sender<ServerMessage>) {
        self.clients.insert(client_id, Client::new(client_id, sender));
    }

    /// Forget a connection and drop it from every group
    ///
    /// Dropping the client closes its outbound channel.
    pub fn unregister(&mut self, client_id: ClientId) {
        self.clients.remove(&client_id);
        for subscribers in self.groups.values_mut() {
            subscribers.remove(&client_id);
        }
        self.groups.retain(|_, subscribers| !subscribers.is_empty());
    }

    pub fn subscribe(&mut self, client_id: ClientId, code: &RoomCode) {
        self.groups.entry(code.clone()).or_default().insert(client_id);
    }

    pub fn unsubscribe(&mut self, client_id: ClientId, code: &RoomCode) {
        if let Some(subscribers) = self.groups.get_mut(code) {
            subscribers.remove(&client_id);
            if subscribers.is_empty() {
                self.groups.remove(code);
            }
        }
    }

    /// Tear down a room's subscription group
    pub fn dissolve(&mut self, code: &RoomCode) {
        self.groups.remove(code);
    }

    pub fn is_subscribed(&self, client_id: ClientId, code: &RoomCode) -> bool {
        self.groups
            .get(code)
            .is_some_and(|subscribers| subscribers.contains(&client_id))
    }

    /// Next client evicted for falling behind
    pub fn take_evicted(&mut self) -> Option<ClientId> {
        self.evicted.pop()
    }

    /// Deliver to one connection
    pub fn send_to(&mut self, client_id: ClientId, msg: ServerMessage) {
        let Some(client) = self.clients.get(&client_id) else {
            debug!("Dropping event for unknown client {}", client_id);
            return;
        };
        match client.send(msg) {
            Ok(()) => {}
            Err(SendError::ChannelFull) => {
                warn!("Client {} is not keeping up, dropping connection", client_id);
                self.unregister(client_id);
                self.evicted.push(client_id);
            }
            Err(SendError::ChannelClosed) => {
                debug!("Client {} is already gone", client_id);
            }
        }
    }

    /// Deliver to every subscriber of a room
    pub fn broadcast(&mut self, code: &RoomCode, msg: &ServerMessage) {
        for client_id in self.subscribers(code) {
            self.send_to(client_id, msg.clone());
        }
    }

    /// Deliver to every subscriber of a room except `skip`
    pub fn broadcast_except(&mut self, code: &RoomCode, msg: &ServerMessage, skip: ClientId) {
        for client_id in self.subscribers(code) {
            if client_id != skip {
                self.send_to(client_id, msg.clone());
            }
        }
    }

    fn subscribers(&self, code: &RoomCode) -> Vec<ClientId> {
        self.groups
            .get(code)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }
}
