//! Cancellation token scoped to a session's lifetime.
//!
//! Long-running async work (the warm-start download loop in particular)
//! checks the token between awaits and aborts with `CliError::Cancelled`
//! once it fires, instead of running to completion against state nobody
//! is watching anymore.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation flag. All clones observe a single `cancel`.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Fire the token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the token fires. Resolves immediately if it already has.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_clones_observe_cancel() {
        let token = CancelToken::new();
        let mut clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
        // Must resolve without hanging.
        clone.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let mut waiter = CancelToken::new();
        let trigger = waiter.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        trigger.cancel();
        handle.await.unwrap();
    }
}
