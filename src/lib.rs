//! Room-based WebSocket Chat Relay Library
//!
//! A WebSocket chat relay built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - Room creation with 6-character `[A-Z0-9]` codes
//! - Joining by code (case-insensitive), up to 10 members per room
//! - Host-only room closing
//! - Room-scoped chat with server-side display names
//! - Disconnection handling with delayed room cleanup
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `RoomRegistry` and `Hub`
//! - Each connection has a `handler` task communicating with the server
//! - Grace-delay timers report back to the server as commands
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use room_relay::{ChatServer, ServerConfig, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     let (server, cmd_tx) = ChatServer::channel(&config);
//!
//!     tokio::spawn(server.run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx, config.outbound_buffer));
//!     }
//! }
//! ```

pub mod cleanup;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod hub;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use cleanup::CleanupScheduler;
pub use client::Client;
pub use config::ServerConfig;
pub use error::{AppError, RoomError, SendError};
pub use handler::handle_connection;
pub use hub::Hub;
pub use message::{ClientMessage, ServerMessage};
pub use registry::RoomRegistry;
pub use room::Room;
pub use server::{ChatServer, ServerCommand};
pub use types::{ClientId, RoomCode};
