//! Auth-state relay — forward provider changes to the server session store,
//! then refresh the local user from the provider.
//!
//! DESIGN
//! ======
//! Changes are consumed one at a time from the provider subscription. For
//! each one the relay awaits the session persist, then re-fetches the user
//! from the provider instead of trusting the session embedded in the event.
//! The server store therefore lags the client by at most one change.
//!
//! ERROR HANDLING
//! ==============
//! A failed persist does not skip the re-fetch: client state keeps tracking
//! the provider and the next change gives the server another chance. A
//! re-fetch the auth server rejects (401/403) clears `user`; any other failed
//! re-fetch leaves it untouched. Both are returned from `handle` and
//! logged by `run`, which then moves on to the next change. Nothing is
//! retried or rolled back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::provider::{AuthProvider, AuthSubscription};
use crate::state::SessionState;
use crate::types::AuthStateChange;

// =============================================================================
// SESSION STORE
// =============================================================================

/// Server-side session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn persist(&self, change: &AuthStateChange) -> Result<(), SyncError>;
}

/// Posts `{event, session}` as JSON to the session endpoint. Cookies set by
/// the endpoint are kept and sent back on later calls.
pub struct HttpSessionStore {
    http: reqwest::Client,
    url: String,
}

impl HttpSessionStore {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| SyncError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: config.session_url() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn persist(&self, change: &AuthStateChange) -> Result<(), SyncError> {
        let response = self
            .http
            .post(&self.url)
            .json(change)
            .send()
            .await
            .map_err(|e| SyncError::SessionRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::SessionResponse { status: status.as_u16() });
        }
        Ok(())
    }
}

// =============================================================================
// RELAY
// =============================================================================

pub struct AuthStateRelay {
    provider: Arc<dyn AuthProvider>,
    state: SessionState,
    store: Arc<dyn SessionStore>,
}

impl AuthStateRelay {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>, state: SessionState, store: Arc<dyn SessionStore>) -> Self {
        Self { provider, state, store }
    }

    /// Persist one change, then refresh `user` from the provider.
    ///
    /// # Errors
    ///
    /// Returns the re-fetch error if the provider call failed (clearing `user`
    /// when the session was rejected), otherwise the
    /// persist error if the session store call failed.
    pub async fn handle(&self, change: &AuthStateChange) -> Result<(), SyncError> {
        let persisted = self.store.persist(change).await;
        if let Err(e) = &persisted {
            warn!(event = %change.event, error = %e, code = e.error_code(), "relay: session persist failed");
        }

        match self.provider.get_user().await {
            Ok(user) => {
                debug!(event = %change.event, has_user = user.is_some(), "relay: user refreshed");
                self.state.user.set(user);
            }
            Err(e) => {
                warn!(event = %change.event, error = %e, code = e.error_code(), "relay: user refresh failed");
                if e.is_unauthorized() {
                    self.state.user.set(None);
                }
                return Err(e.into());
            }
        }

        persisted
    }

    /// Process changes in order until the subscription closes.
    /// Returns the number of changes handled.
    pub async fn run(&self, mut subscription: AuthSubscription) -> usize {
        info!(subscription = subscription.id(), "relay: listening for auth state changes");
        let mut handled = 0;
        while let Some(change) = subscription.recv().await {
            if let Err(e) = self.handle(&change).await {
                warn!(event = %change.event, error = %e, retryable = e.retryable(), "relay: change not fully synced");
            }
            handled += 1;
        }
        info!(handled, "relay: auth state subscription closed");
        handled
    }
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
