//! ChatServer Actor implementation
//!
//! The session event handler. Owns the room registry and the connection hub,
//! and processes one command at a time from an mpsc channel, so every
//! registry operation is atomic with respect to every other. Scheduled
//! deletions come back through the same channel.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cleanup::CleanupScheduler;
use crate::config::ServerConfig;
use crate::hub::Hub;
use crate::message::{clean_name, ClientMessage, ServerMessage};
use crate::registry::{Cleanup, DisconnectEffect, RoomRegistry};
use crate::types::{ClientId, RoomCode};

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Commands sent to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect { client_id: ClientId },
    /// Decoded inbound event
    Event {
        client_id: ClientId,
        message: ClientMessage,
    },
    /// Inbound frame that could not be decoded
    Malformed { client_id: ClientId, reason: String },
    /// A grace delay elapsed
    Expire { cleanup: Cleanup },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All rooms
    registry: RoomRegistry,
    /// All connections and room subscription groups
    hub: Hub,
    /// Delayed deletions
    scheduler: CleanupScheduler,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a server and the sender used to reach it
    pub fn channel(config: &ServerConfig) -> (Self, mpsc::Sender<ServerCommand>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let scheduler =
            CleanupScheduler::new(sender.downgrade(), config.close_grace, config.empty_grace);

        let server = Self {
            registry: RoomRegistry::new(config.max_members),
            hub: Hub::new(),
            scheduler,
            receiver,
        };

        (server, sender)
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command, then disconnect any client that fell behind
    fn handle_command(&mut self, cmd: ServerCommand) {
        self.dispatch(cmd);

        while let Some(client_id) = self.hub.take_evicted() {
            self.handle_disconnect(client_id);
        }
    }

    fn dispatch(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
            ServerCommand::Event { client_id, message } => {
                self.handle_event(client_id, message);
            }
            ServerCommand::Malformed { client_id, reason } => {
                self.hub.send_to(
                    client_id,
                    ServerMessage::Error {
                        message: format!("Invalid message format: {}", reason),
                    },
                );
            }
            ServerCommand::Expire { cleanup } => {
                self.handle_expire(cleanup);
            }
        }
    }

    fn handle_event(&mut self, client_id: ClientId, message: ClientMessage) {
        match message {
            ClientMessage::CreateRoom { name } => self.handle_create_room(client_id, &name),
            ClientMessage::JoinRoom { room, name } => {
                self.handle_join_room(client_id, RoomCode::from_string(room), &name)
            }
            ClientMessage::ChatMessage { text, room } => {
                self.handle_chat(client_id, RoomCode::from_string(room), text)
            }
            ClientMessage::LeaveRoom(room) => {
                self.handle_leave_room(client_id, RoomCode::from_string(room))
            }
            ClientMessage::CloseRoom(room) => {
                self.handle_close_room(client_id, RoomCode::from_string(room))
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::Sender<ServerMessage>) {
        info!("Client {} connected", client_id);
        self.hub.register(client_id, sender);
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.hub.client_count(),
            self.registry.len()
        );
    }

    /// Handle client disconnection
    ///
    /// Nothing is sent to the departing client; it is unregistered first.
    fn handle_disconnect(&mut self, client_id: ClientId) {
        info!("Client {} disconnected", client_id);
        self.hub.unregister(client_id);

        for effect in self.registry.disconnect(client_id) {
            match effect {
                DisconnectEffect::HostGone { code, cleanup } => {
                    self.hub.broadcast(
                        &code,
                        &ServerMessage::RoomClosed {
                            room: code.to_string(),
                            message: "The host disconnected".to_string(),
                        },
                    );
                    self.scheduler.schedule(cleanup);
                }
                DisconnectEffect::MemberGone {
                    code,
                    name,
                    cleanup,
                } => {
                    self.hub.broadcast(
                        &code,
                        &ServerMessage::system(format!("{} disconnected", name)),
                    );
                    if let Some(cleanup) = cleanup {
                        self.scheduler.schedule(cleanup);
                    }
                }
            }
        }

        debug!(
            "Total clients: {}, Total rooms: {}",
            self.hub.client_count(),
            self.registry.len()
        );
    }

    /// Handle room creation
    fn handle_create_room(&mut self, client_id: ClientId, name: &str) {
        let name = match clean_name(name) {
            Ok(name) => name,
            Err(e) => {
                self.hub.send_to(client_id, e.into());
                return;
            }
        };

        let code = self.registry.create(client_id, name);
        self.hub.subscribe(client_id, &code);
        self.hub.send_to(
            client_id,
            ServerMessage::RoomCreated {
                code: code.to_string(),
            },
        );
    }

    /// Handle room joining
    fn handle_join_room(&mut self, client_id: ClientId, code: RoomCode, name: &str) {
        let joined = clean_name(name).and_then(|name| self.registry.join(&code, client_id, name));
        let joined = match joined {
            Ok(joined) => joined,
            Err(e) => {
                debug!("Client {} could not join {}: {}", client_id, code, e);
                self.hub.send_to(client_id, e.into());
                return;
            }
        };

        self.hub.subscribe(client_id, &joined.code);
        self.hub.send_to(
            client_id,
            ServerMessage::RoomJoined {
                code: joined.code.to_string(),
            },
        );
        // The joiner is already subscribed, so it sees the same notice as everyone
        self.hub.broadcast(
            &joined.code,
            &ServerMessage::system(format!("{} joined the room", joined.name)),
        );
    }

    /// Handle chat message
    ///
    /// Messages from non-members or into missing rooms are dropped without reply.
    fn handle_chat(&mut self, client_id: ClientId, code: RoomCode, text: String) {
        if text.trim().is_empty() {
            return;
        }

        let Some(posted) = self.registry.post_message(&code, client_id, text) else {
            debug!("Dropped chat from {} to {}", client_id, code);
            return;
        };

        self.hub
            .broadcast(&code, &ServerMessage::chat(posted.name, posted.text));
    }

    /// Handle voluntary room leaving
    fn handle_leave_room(&mut self, client_id: ClientId, code: RoomCode) {
        let Some(departure) = self.registry.leave(&code, client_id) else {
            debug!("Client {} is not in room {}", client_id, code);
            return;
        };

        self.hub.unsubscribe(client_id, &code);

        if departure.room_deleted {
            self.hub.dissolve(&code);
        } else if !departure.was_closing {
            self.hub.broadcast(
                &code,
                &ServerMessage::system(format!("{} left the room", departure.name)),
            );
        }
    }

    /// Handle room closing by its host
    fn handle_close_room(&mut self, client_id: ClientId, code: RoomCode) {
        let cleanup = match self.registry.close(&code, client_id) {
            Ok(cleanup) => cleanup,
            Err(e) => {
                warn!("Client {} could not close {}: {}", client_id, code, e);
                self.hub.send_to(client_id, e.into());
                return;
            }
        };

        // The host gets its own acknowledgment instead of the room notice
        self.hub.broadcast_except(
            &code,
            &ServerMessage::RoomClosed {
                room: code.to_string(),
                message: "The host closed the room".to_string(),
            },
            client_id,
        );
        self.hub.send_to(client_id, ServerMessage::RoomClosedByHost);
        self.scheduler.schedule(cleanup);
    }

    /// Handle an elapsed grace delay
    fn handle_expire(&mut self, cleanup: Cleanup) {
        if self.registry.expire(&cleanup) {
            self.hub.dissolve(&cleanup.code);
        }
    }
}
