//! Client struct definition
//!
//! Represents a connected client and its outbound communication channel.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Connected client information
///
/// Display names are per room and live in the room roster, not here.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Queue a message for this client without waiting
    ///
    /// Fails if the channel is closed (client disconnected) or full
    /// (client too slow); the server never blocks on one connection.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_send() {
        let (tx, mut rx) = mpsc::channel(32);
        let client = Client::new(ClientId::new(), tx);

        client.send(ServerMessage::RoomClosedByHost).unwrap();

        assert_eq!(rx.recv().await, Some(ServerMessage::RoomClosedByHost));
    }

    #[tokio::test]
    async fn test_client_send_full_or_closed() {
        let (tx, rx) = mpsc::channel(1);
        let client = Client::new(ClientId::new(), tx);

        client.send(ServerMessage::RoomClosedByHost).unwrap();
        assert!(matches!(
            client.send(ServerMessage::RoomClosedByHost),
            Err(SendError::ChannelFull)
        ));

        drop(rx);
        assert!(matches!(
            client.send(ServerMessage::RoomClosedByHost),
            Err(SendError::ChannelClosed)
        ));
    }
}
