//! Shutdown coordination for the server.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (server and signal tasks).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger();
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_receiver_count_tracks_subscribers() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.receiver_count(), 0);
        let first = shutdown.subscribe();
        let _second = shutdown.clone().subscribe();
        assert_eq!(shutdown.receiver_count(), 2);
        drop(first);
        assert_eq!(shutdown.receiver_count(), 1);
    }
}
