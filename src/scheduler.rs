//! Deferred actions — run work after the current update cycle.
//!
//! DESIGN
//! ======
//! Navigation must not happen while state watchers are still running, so
//! watchers enqueue closures here instead of acting directly. `flush` runs
//! only what was queued before it started; anything deferred during a flush
//! waits for the next one. `spawn_runner` drives the queue from a tokio task,
//! yielding once before each flush.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

type Action = Box<dyn FnOnce() + Send>;

struct Deferred {
    label: &'static str,
    action: Action,
}

#[derive(Default)]
struct Inner {
    queue: Mutex<VecDeque<Deferred>>,
    notify: Notify,
}

#[derive(Clone, Default)]
pub struct DeferredQueue {
    inner: Arc<Inner>,
}

impl DeferredQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run on the next flush.
    pub fn defer<F>(&self, label: &'static str, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Deferred { label, action: Box::new(action) });
        self.inner.notify.notify_one();
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Run every action queued before this call. Returns how many ran.
    pub fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner));
        let count = batch.len();
        for deferred in batch {
            debug!(label = deferred.label, "running deferred action");
            (deferred.action)();
        }
        count
    }

    /// Drive the queue from a background task until the handle is aborted.
    pub fn spawn_runner(&self) -> JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            loop {
                queue.inner.notify.notified().await;
                tokio::task::yield_now().await;
                queue.flush();
            }
        })
    }
}

impl std::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredQueue").field("pending", &self.pending()).finish()
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
