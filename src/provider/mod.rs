//! Auth provider seam and auth-state-change subscriptions.
//!
//! DESIGN
//! ======
//! Providers expose their change stream as an `AuthSubscription`: a bounded
//! channel plus an explicit unregister path. `AuthEvents` is the fan-out hub
//! a provider embeds to hand out subscriptions and emit changes.
//!
//! `emit` awaits channel capacity for each subscriber in turn, so a slow
//! consumer applies backpressure to the provider instead of losing events.
//! Subscribers whose receiver is gone are dropped from the hub.

pub mod gotrue;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{AuthStateChange, Token, User};

pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 16;

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve an explicit bearer token into its user.
    async fn get_user_for_token(&self, token: &Token) -> Result<Option<User>, ProviderError>;

    /// The user for the provider's current session, if any.
    async fn get_user(&self) -> Result<Option<User>, ProviderError>;

    /// Subscribe to auth-state changes.
    fn on_auth_state_change(&self) -> AuthSubscription;
}

// =============================================================================
// EVENT HUB
// =============================================================================

type Registry = Mutex<HashMap<u64, mpsc::Sender<AuthStateChange>>>;

/// Fan-out of auth-state changes to subscribers.
#[derive(Clone)]
pub struct AuthEvents {
    registry: Arc<Registry>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// Hub whose subscriptions buffer up to `capacity` changes (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { registry: Arc::new(Mutex::new(HashMap::new())), next_id: Arc::new(AtomicU64::new(0)), capacity: capacity.max(1) }
    }

    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        self.subscribe_with(None)
    }

    /// Subscribe, delivering `initial` as the first change on the new channel.
    #[must_use]
    pub fn subscribe_with(&self, initial: Option<AuthStateChange>) -> AuthSubscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        if let Some(change) = initial {
            // Fresh channel with capacity >= 1: cannot be full or closed.
            let _ = tx.try_send(change);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, tx);
        debug!(subscription = id, "auth subscription registered");

        AuthSubscription { id, rx, registry: Arc::downgrade(&self.registry) }
    }

    /// Deliver `change` to every live subscriber. Returns how many received it.
    pub async fn emit(&self, change: AuthStateChange) -> usize {
        let senders: Vec<(u64, mpsc::Sender<AuthStateChange>)> =
            self.lock().iter().map(|(id, tx)| (*id, tx.clone())).collect();

        let mut delivered = 0;
        for (id, tx) in senders {
            if tx.send(change.clone()).await.is_ok() {
                delivered += 1;
            } else {
                self.lock().remove(&id);
            }
        }

        debug!(event = %change.event, delivered, "auth state change emitted");
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<AuthStateChange>>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Receiving end of an auth-state-change stream. Dropping it unregisters.
pub struct AuthSubscription {
    id: u64,
    rx: mpsc::Receiver<AuthStateChange>,
    registry: Weak<Registry>,
}

impl AuthSubscription {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next change, or `None` once the provider side has gone away.
    pub async fn recv(&mut self) -> Option<AuthStateChange> {
        self.rx.recv().await
    }

    /// Stop receiving changes and remove this subscriber from the hub.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.id);
            debug!(subscription = self.id, "auth subscription removed");
        }
    }
}

impl std::fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSubscription").field("id", &self.id).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
