//! Background worker removing idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::store::SessionStore;

/// Periodically purges expired sessions from a [`SessionStore`].
pub struct SessionSweeper {
    store: Arc<SessionStore>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl SessionSweeper {
    /// Create a sweeper running every `interval`.
    #[must_use]
    pub fn new(store: Arc<SessionStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Notifier that stops the worker.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the worker as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(interval = ?self.interval, "Starting session sweeper");

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {
                    let removed = self.store.purge_expired();
                    if removed > 0 {
                        info!(removed, remaining = self.store.len(), "Expired sessions purged");
                    } else {
                        debug!("Session sweep found nothing to purge");
                    }
                }
                () = self.shutdown.notified() => {
                    info!("Session sweeper shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let sweeper = SessionSweeper::new(store, Duration::from_secs(45));
        let shutdown = sweeper.shutdown_notifier();
        let handle = sweeper.spawn();

        shutdown.notify_one();
        let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }
}
