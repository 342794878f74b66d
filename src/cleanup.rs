//! Delayed room cleanup
//!
//! Deletions are not run on the timer task itself. When a delay elapses the
//! timer sends an `Expire` command back to the server actor, which re-checks
//! the room under the same exclusivity as every other operation.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::registry::{Cleanup, CleanupKind};
use crate::server::ServerCommand;

/// Schedules room deletions after a grace delay
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    /// Weak handle so pending timers never keep the server alive
    commands: mpsc::WeakSender<ServerCommand>,
    close_grace: Duration,
    empty_grace: Duration,
}

impl CleanupScheduler {
    pub fn new(
        commands: mpsc::WeakSender<ServerCommand>,
        close_grace: Duration,
        empty_grace: Duration,
    ) -> Self {
        Self {
            commands,
            close_grace,
            empty_grace,
        }
    }

    /// Grace delay for a cleanup kind
    pub fn delay_for(&self, kind: CleanupKind) -> Duration {
        match kind {
            CleanupKind::Close => self.close_grace,
            CleanupKind::Empty => self.empty_grace,
        }
    }

    /// Arm the deletion described by `cleanup`
    pub fn schedule(&self, cleanup: Cleanup) {
        let delay = self.delay_for(cleanup.kind);
        debug!(
            "Room {} cleanup ({:?}) in {:?}",
            cleanup.code, cleanup.kind, delay
        );
        self.after(delay, ServerCommand::Expire { cleanup });
    }

    /// Deliver `command` to the server once `delay` has elapsed
    ///
    /// Dropped silently if the server has shut down by then.
    pub fn after(&self, delay: Duration, command: ServerCommand) {
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(command).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomCode;

    fn cleanup(kind: CleanupKind) -> Cleanup {
        Cleanup {
            code: RoomCode::from_string("ABC123"),
            ticket: 0,
            kind,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = CleanupScheduler::new(
            tx.downgrade(),
            Duration::from_secs(1),
            Duration::from_secs(5),
        );

        let start = tokio::time::Instant::now();
        scheduler.schedule(cleanup(CleanupKind::Empty));

        let Some(ServerCommand::Expire { cleanup: fired }) = rx.recv().await else {
            panic!("Expected an expire command");
        };
        assert_eq!(fired.kind, CleanupKind::Empty);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_delay_per_kind() {
        let (tx, _rx) = mpsc::channel(8);
        let scheduler = CleanupScheduler::new(
            tx.downgrade(),
            Duration::from_secs(1),
            Duration::from_secs(5),
        );

        assert_eq!(scheduler.delay_for(CleanupKind::Close), Duration::from_secs(1));
        assert_eq!(scheduler.delay_for(CleanupKind::Empty), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_server_is_ignored() {
        let (tx, rx) = mpsc::channel(8);
        let scheduler = CleanupScheduler::new(
            tx.downgrade(),
            Duration::from_secs(1),
            Duration::from_secs(5),
        );
        drop(tx);
        drop(rx);

        scheduler.schedule(cleanup(CleanupKind::Close));
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}
