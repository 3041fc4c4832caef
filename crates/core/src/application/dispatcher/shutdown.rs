// Dispatcher Shutdown Token

use tokio::sync::watch;

/// Shutdown signal for graceful termination
///
/// Cheap to clone; every clone observes the same signal.
#[derive(Clone, Debug)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested (immediately if it already was)
    ///
    /// Also resolves if the sender is dropped, so an abandoned sender can not
    /// leave a loop running forever.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Shutdown sender
#[derive(Debug)]
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every token
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Hand out another token tied to this sender
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_observes_shutdown() {
        let (tx, token) = shutdown_channel();
        let late = tx.token();
        assert!(!token.is_shutdown());

        tx.shutdown();
        assert!(token.is_shutdown());
        assert!(late.is_shutdown());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_signal() {
        let (tx, mut token) = shutdown_channel();
        tx.shutdown();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("already-signalled token must resolve immediately");
    }

    #[tokio::test]
    async fn test_cancelled_resolves_when_sender_dropped() {
        let (tx, mut token) = shutdown_channel();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("dropped sender must release waiters");
    }
}
