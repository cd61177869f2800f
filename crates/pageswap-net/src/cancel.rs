//! Cancellation Tokens
//!
//! Cooperative abort handles threaded through page fetches.

use smol::channel::{self, Receiver, Sender};

/// Cloneable cancellation token
///
/// All clones observe the same state. Cancelling closes a channel nobody
/// ever sends on, which wakes every pending `cancelled()` future.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(1);
        Self { tx, rx }
    }

    /// Cancel the token. Idempotent.
    pub fn cancel(&self) {
        if self.tx.close() {
            tracing::trace!("Cancellation token fired");
        }
    }

    /// Check if the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolve once the token is cancelled
    pub async fn cancelled(&self) {
        while self.rx.recv().await.is_ok() {}
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol::future;

    #[test]
    fn test_cancel_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancelled_resolves() {
        let token = CancellationToken::new();
        let waiter = token.clone();

        smol::block_on(async {
            let (_, ()) = future::zip(
                async { token.cancel() },
                waiter.cancelled(),
            ).await;
        });
        assert!(waiter.is_cancelled());
    }

    #[test]
    fn test_cancelled_pending_until_cancel() {
        let token = CancellationToken::new();
        let result = smol::block_on(future::or(
            async { token.cancelled().await; false },
            async { future::yield_now().await; true },
        ));
        assert!(result);
    }
}
