//! Login redirect guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Installed when a login path is configured. Sends the user to the login
//! page whenever the session user becomes absent, unless they are already
//! there.
//!
//! DESIGN
//! ======
//! The guard re-evaluates on install and on every `user` mutation. The
//! navigation itself goes through the `DeferredQueue` so it runs after the
//! current update cycle. A pending flag keeps repeated "still signed out"
//! mutations from stacking navigations; it is cleared when the deferred
//! navigation runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::navigation::Navigator;
use crate::reactive::WatchHandle;
use crate::scheduler::DeferredQueue;
use crate::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// A user is present.
    Authenticated,
    /// Already on the login page.
    OnLoginPage,
    /// A redirect is queued and has not run yet.
    AlreadyPending,
    /// Queue a redirect to the login page.
    Redirect,
}

/// Pure redirect rule.
#[must_use]
pub fn decide(user_present: bool, current_path: &str, login_path: &str, pending: bool) -> GuardDecision {
    if user_present {
        GuardDecision::Authenticated
    } else if current_path == login_path {
        GuardDecision::OnLoginPage
    } else if pending {
        GuardDecision::AlreadyPending
    } else {
        GuardDecision::Redirect
    }
}

#[derive(Debug)]
pub struct RedirectGuard {
    login_path: Arc<str>,
    pending: Arc<AtomicBool>,
    watch: WatchHandle,
}

impl RedirectGuard {
    /// Install the guard and evaluate it once against the current user.
    #[must_use]
    pub fn install(
        state: &SessionState,
        login_path: impl Into<String>,
        navigator: Arc<dyn Navigator>,
        queue: DeferredQueue,
    ) -> Self {
        let login_path: Arc<str> = Arc::from(login_path.into());
        let pending = Arc::new(AtomicBool::new(false));

        let watch = {
            let login_path = Arc::clone(&login_path);
            let pending = Arc::clone(&pending);
            state.user.watch_immediate(move |user| {
                evaluate(user.is_some(), &login_path, &navigator, &queue, &pending);
            })
        };

        info!(login_path = %login_path, "redirect guard installed");
        Self { login_path, pending, watch }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Whether a redirect is queued and has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Stop reacting to user changes. Already-queued redirects still run.
    pub fn uninstall(self) {
        self.watch.unwatch();
    }
}

fn evaluate(
    user_present: bool,
    login_path: &Arc<str>,
    navigator: &Arc<dyn Navigator>,
    queue: &DeferredQueue,
    pending: &Arc<AtomicBool>,
) {
    let current = navigator.current_path();
    let mut decision = decide(user_present, &current, login_path, pending.load(Ordering::Acquire));
    // Claim the pending flag atomically; concurrent mutations may both get here.
    if decision == GuardDecision::Redirect
        && pending.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
    {
        decision = GuardDecision::AlreadyPending;
    }
    debug!(?decision, current_path = %current, "redirect guard evaluated");

    if decision != GuardDecision::Redirect {
        return;
    }

    let login_path = Arc::clone(login_path);
    let navigator = Arc::clone(navigator);
    let pending = Arc::clone(pending);
    queue.defer("login-redirect", move || {
        pending.store(false, Ordering::Release);
        info!(to = %login_path, "redirecting to login");
        navigator.navigate_to(&login_path);
    });
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
