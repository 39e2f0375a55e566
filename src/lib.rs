//! Session sync — keeps client auth state aligned with an auth provider and
//! with the server's session store.
//!
//! ARCHITECTURE
//! ============
//! `SessionSync` runs once per application start. It resolves a cached token
//! into a user (`bootstrap`), optionally installs a login redirect guard
//! (`guard`), and after the host signals it has mounted, relays every provider
//! auth-state change to the server before re-fetching the current user
//! (`relay`).
//!
//! The provider, navigation, and session store are traits so hosts can plug
//! in their own. `GoTrueProvider` and `HttpSessionStore` cover the common
//! Supabase setup.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod navigation;
pub mod provider;
pub mod reactive;
pub mod relay;
pub mod scheduler;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use bootstrap::{BootstrapOutcome, SessionSync, SyncHandle, bootstrap};
pub use config::{RedirectConfig, SyncConfig};
pub use error::{ProviderError, SyncError};
pub use guard::RedirectGuard;
pub use lifecycle::MountSignal;
pub use navigation::{MemoryNavigator, Navigator};
pub use provider::gotrue::{GoTrueConfig, GoTrueProvider};
pub use provider::{AuthEvents, AuthProvider, AuthSubscription};
pub use reactive::{Reactive, WatchHandle};
pub use relay::{AuthStateRelay, HttpSessionStore, SessionStore};
pub use scheduler::DeferredQueue;
pub use state::SessionState;
pub use types::{AuthChangeEvent, AuthStateChange, Session, Token, User};

/// Install a `fmt` tracing subscriber for hosts that don't configure their own.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}
