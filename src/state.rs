//! Client session state.
//!
//! DESIGN
//! ======
//! `SessionState` owns the two cells the sync logic reads and writes: the
//! current user and the cached bearer token. It is cheap to clone; clones
//! share the same cells. Hosts that render on the server can hand in a
//! pre-populated user via `hydrated`.

use crate::reactive::Reactive;
use crate::types::{Token, User};

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub user: Reactive<Option<User>>,
    pub token: Reactive<Option<Token>>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State already populated by server-side rendering or a cookie read.
    #[must_use]
    pub fn hydrated(user: Option<User>, token: Option<Token>) -> Self {
        Self { user: Reactive::new(user), token: Reactive::new(token) }
    }

    #[must_use]
    pub fn has_user(&self) -> bool {
        self.user.with(Option::is_some)
    }

    /// Drop both token and user (token first).
    pub fn clear(&self) {
        self.token.set(None);
        self.user.set(None);
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
