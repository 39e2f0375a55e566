//! Host lifecycle hook: "the application has finished mounting".
//!
//! The relay waits on this before subscribing to provider events so it
//! cannot trigger navigation while the first render is still hydrating.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone, Debug)]
pub struct MountSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl MountSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal that the host has mounted. Later calls are no-ops.
    pub fn mark_mounted(&self) {
        self.tx.send_if_modified(|mounted| !std::mem::replace(mounted, true));
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once `mark_mounted` has been called (immediately if it already was).
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|mounted| *mounted).await;
    }
}

impl Default for MountSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
