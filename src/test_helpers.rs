//! Mocks shared by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::time::{Duration, Instant};

use crate::error::{ProviderError, SyncError};
use crate::provider::{AuthEvents, AuthProvider, AuthSubscription};
use crate::relay::SessionStore;
use crate::types::{AuthStateChange, Token, User};

pub(crate) fn user(id: &str) -> User {
    User::new(json!({ "id": id }))
}

/// Ordered record of calls across mocks.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("call log should lock").push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().expect("call log should lock").clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Poll `cond` until it holds or a second passes.
pub(crate) async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(1);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not met within 1s");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

pub(crate) struct MockProvider {
    token_result: Result<Option<User>, ProviderError>,
    current: Mutex<Result<Option<User>, ProviderError>>,
    log: CallLog,
    pub(crate) events: AuthEvents,
}

impl MockProvider {
    pub(crate) fn resolving(user: User, log: CallLog) -> Self {
        Self::with_token_result(Ok(Some(user)), log)
    }

    pub(crate) fn failing(error: ProviderError, log: CallLog) -> Self {
        Self::with_token_result(Err(error), log)
    }

    pub(crate) fn with_token_result(token_result: Result<Option<User>, ProviderError>, log: CallLog) -> Self {
        Self { token_result, current: Mutex::new(Ok(None)), log, events: AuthEvents::new() }
    }

    /// What `get_user()` returns from now on.
    pub(crate) fn set_current(&self, result: Result<Option<User>, ProviderError>) {
        *self.current.lock().expect("mock mutex should lock") = result;
    }
}

#[async_trait]
impl AuthProvider for MockProvider {
    async fn get_user_for_token(&self, token: &Token) -> Result<Option<User>, ProviderError> {
        self.log.push(format!("resolve_token:{}", token.as_str()));
        self.token_result.clone()
    }

    async fn get_user(&self) -> Result<Option<User>, ProviderError> {
        self.log.push("get_user");
        self.current.lock().expect("mock mutex should lock").clone()
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.log.push("subscribe");
        self.events.subscribe()
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

pub(crate) struct RecordingStore {
    log: CallLog,
    bodies: Mutex<Vec<serde_json::Value>>,
    fail_status: Option<u16>,
}

impl RecordingStore {
    pub(crate) fn new(log: CallLog) -> Self {
        Self { log, bodies: Mutex::new(Vec::new()), fail_status: None }
    }

    pub(crate) fn failing(log: CallLog, status: u16) -> Self {
        Self { log, bodies: Mutex::new(Vec::new()), fail_status: Some(status) }
    }

    pub(crate) fn bodies(&self) -> Vec<serde_json::Value> {
        self.bodies.lock().expect("mock mutex should lock").clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn persist(&self, change: &AuthStateChange) -> Result<(), SyncError> {
        self.log.push(format!("persist:{}", change.event));
        let body = serde_json::to_value(change).expect("change should serialize");
        self.bodies.lock().expect("mock mutex should lock").push(body);
        match self.fail_status {
            Some(status) => Err(SyncError::SessionResponse { status }),
            None => Ok(()),
        }
    }
}
