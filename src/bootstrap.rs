//! Startup reconciliation and the `SessionSync` orchestrator.
//!
//! ARCHITECTURE
//! ============
//! `SessionSync::start` runs once per application start:
//! 1. `bootstrap` resolves a cached token into a user when nothing was
//!    hydrated from the server.
//! 2. If a login path is configured, a `RedirectGuard` is installed. The
//!    `DeferredQueue` runner is spawned alongside so its redirects execute.
//! 3. A relay task waits for the host's mount signal, subscribes to the
//!    provider, and forwards every change to the session store.
//!
//! Waiting for mount keeps the relay from triggering navigation while the
//! first render is still hydrating.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::guard::RedirectGuard;
use crate::lifecycle::MountSignal;
use crate::navigation::Navigator;
use crate::provider::AuthProvider;
use crate::relay::{AuthStateRelay, SessionStore};
use crate::scheduler::DeferredQueue;
use crate::state::SessionState;

// =============================================================================
// BOOTSTRAP
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A user was already present; the provider was not called.
    AlreadyHydrated,
    /// No user and no token; nothing to resolve.
    NoToken,
    /// The token resolved and `user` was set.
    Resolved,
    /// The token did not resolve; `token` and `user` were cleared.
    Cleared,
}

/// Resolve the cached token into a user if no user is present.
///
/// One provider call at most, no retries. Any failure to produce a user
/// clears both cells so the state is never half signed in.
pub async fn bootstrap(state: &SessionState, provider: &dyn AuthProvider) -> BootstrapOutcome {
    if state.has_user() {
        return BootstrapOutcome::AlreadyHydrated;
    }
    let Some(token) = state.token.get() else {
        return BootstrapOutcome::NoToken;
    };

    match provider.get_user_for_token(&token).await {
        Ok(Some(user)) => {
            state.user.set(Some(user));
            BootstrapOutcome::Resolved
        }
        Ok(None) => {
            warn!("bootstrap: token resolved to no user, clearing session");
            state.clear();
            BootstrapOutcome::Cleared
        }
        Err(e) => {
            warn!(error = %e, code = e.error_code(), "bootstrap: token resolution failed, clearing session");
            state.clear();
            BootstrapOutcome::Cleared
        }
    }
}

// =============================================================================
// SESSION SYNC
// =============================================================================

pub struct SessionSync {
    config: SyncConfig,
    state: SessionState,
    provider: Arc<dyn AuthProvider>,
    navigator: Arc<dyn Navigator>,
    store: Arc<dyn SessionStore>,
    queue: DeferredQueue,
}

impl SessionSync {
    #[must_use]
    pub fn new(
        config: SyncConfig,
        state: SessionState,
        provider: Arc<dyn AuthProvider>,
        navigator: Arc<dyn Navigator>,
        store: Arc<dyn SessionStore>,
        queue: DeferredQueue,
    ) -> Self {
        Self { config, state, provider, navigator, store, queue }
    }

    /// Bootstrap, install the redirect guard, and schedule the relay to start
    /// once `mounted` fires. Deferred actions on the queue are run by a
    /// background runner owned by the returned handle.
    pub async fn start(self, mounted: MountSignal) -> SyncHandle {
        let runner = self.queue.spawn_runner();
        let outcome = bootstrap(&self.state, self.provider.as_ref()).await;
        info!(?outcome, "session bootstrap complete");

        let guard = self
            .config
            .login_path()
            .map(|login| RedirectGuard::install(&self.state, login, Arc::clone(&self.navigator), self.queue.clone()));

        let relay = AuthStateRelay::new(Arc::clone(&self.provider), self.state.clone(), self.store);
        let provider = self.provider;
        let relay_task = tokio::spawn(async move {
            mounted.wait().await;
            debug!("host mounted, subscribing to auth state changes");
            let subscription = provider.on_auth_state_change();
            relay.run(subscription).await;
        });

        SyncHandle { state: self.state, outcome, guard, relay_task, runner, queue: self.queue }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Running sync. Dropping it leaves the relay running; call `shutdown` to stop.
pub struct SyncHandle {
    state: SessionState,
    outcome: BootstrapOutcome,
    guard: Option<RedirectGuard>,
    relay_task: JoinHandle<()>,
    runner: JoinHandle<()>,
    queue: DeferredQueue,
}

impl SyncHandle {
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn bootstrap_outcome(&self) -> BootstrapOutcome {
        self.outcome
    }

    #[must_use]
    pub fn guard(&self) -> Option<&RedirectGuard> {
        self.guard.as_ref()
    }

    /// Queue the guard schedules redirects on.
    #[must_use]
    pub fn queue(&self) -> &DeferredQueue {
        &self.queue
    }

    #[must_use]
    pub fn is_relay_running(&self) -> bool {
        !self.relay_task.is_finished()
    }

    /// Stop the relay (dropping its subscription) and the queue runner, and
    /// remove the guard. Actions still queued stay queued.
    pub fn shutdown(self) {
        self.relay_task.abort();
        self.runner.abort();
        if let Some(guard) = self.guard {
            guard.uninstall();
        }
        info!("session sync shut down");
    }
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
