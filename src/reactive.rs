//! Observable value cells.
//!
//! DESIGN
//! ======
//! A `Reactive<T>` keeps its value in a `tokio::sync::watch` channel so async
//! consumers can `subscribe()`, and also holds a list of synchronous watchers.
//! `set` is the only mutation path: it stores the value and then notifies
//! every watcher in registration order.
//!
//! Watchers are cloned out of the lock before being called, so a watcher may
//! read the cell it is watching. Calling `set` on the same cell from inside a
//! watcher recurses and is the caller's problem.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

type Watcher<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    tx: watch::Sender<T>,
    watchers: Mutex<Vec<(u64, Watcher<T>)>>,
    next_id: AtomicU64,
}

/// Shared observable cell. Clones point at the same value.
pub struct Reactive<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Clone + Send + Sync + 'static> Reactive<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { inner: Arc::new(Inner { tx, watchers: Mutex::new(Vec::new()), next_id: AtomicU64::new(0) }) }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.tx.borrow().clone()
    }

    /// Borrow the current value. `f` must not call `set` on this cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.tx.borrow())
    }

    /// Store `value` and notify all watchers and subscribers.
    pub fn set(&self, value: T) {
        self.inner.tx.send_replace(value.clone());

        let watchers: Vec<Watcher<T>> = self
            .inner
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, w)| Arc::clone(w))
            .collect();

        for watcher in watchers {
            watcher(&value);
        }
    }

    /// Register `f` to run after every `set`.
    pub fn watch<F>(&self, f: F) -> WatchHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(Arc::new(f))
    }

    /// Like [`watch`](Self::watch), but also runs `f` once with the current value.
    pub fn watch_immediate<F>(&self, f: F) -> WatchHandle
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let watcher: Watcher<T> = Arc::new(f);
        let current = self.get();
        watcher(&current);
        self.register(watcher)
    }

    /// Async receiver that observes every subsequent `set`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.tx.subscribe()
    }

    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn register(&self, watcher: Watcher<T>) -> WatchHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, watcher));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        WatchHandle {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .watchers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(wid, _)| *wid != id);
                }
            })),
        }
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for Reactive<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&*self.inner.tx.borrow()).finish()
    }
}

// =============================================================================
// WATCH HANDLE
// =============================================================================

/// Registration of a watcher. Dropping it unregisters the watcher.
#[must_use = "dropping a WatchHandle unregisters the watcher"]
pub struct WatchHandle {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl WatchHandle {
    pub fn unwatch(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle").field("active", &self.remove.is_some()).finish()
    }
}

#[cfg(test)]
#[path = "reactive_test.rs"]
mod tests;
