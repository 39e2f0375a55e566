//! GoTrue (Supabase Auth) REST adapter.
//!
//! Thin HTTP wrapper for `/auth/v1/user` and `/auth/v1/logout`. Session
//! storage is in memory; `set_session` and `sign_out` emit the matching
//! auth-state changes. Pure parsing in `parse_user` for testability.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{AuthEvents, AuthProvider, AuthSubscription};
use crate::error::ProviderError;
use crate::types::{AuthChangeEvent, AuthStateChange, Session, Token, User};

const USER_PATH: &str = "/auth/v1/user";
const LOGOUT_PATH: &str = "/auth/v1/logout";
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoTrueConfig {
    /// Project URL, without the `/auth/v1` suffix.
    pub url: String,
    pub api_key: String,
}

impl GoTrueConfig {
    /// Build from `SUPABASE_URL` and `SUPABASE_KEY` (both required).
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProviderError::Config("SUPABASE_URL not set".into()))?;
        let api_key = lookup("SUPABASE_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProviderError::Config("SUPABASE_KEY not set".into()))?;
        Ok(Self { url: url.trim().trim_end_matches('/').to_owned(), api_key })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoTrueProvider {
    http: reqwest::Client,
    config: GoTrueConfig,
    session: Mutex<Option<Session>>,
    events: AuthEvents,
}

impl GoTrueProvider {
    pub fn new(config: GoTrueConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config, session: Mutex::new(None), events: AuthEvents::new() })
    }

    /// The locally stored session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Store `session` and announce `SIGNED_IN`.
    pub async fn set_session(&self, session: Session) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        info!("gotrue: session set");
        self.events
            .emit(AuthStateChange::new(AuthChangeEvent::SignedIn, Some(session)))
            .await;
    }

    /// Revoke the session server-side, clear it locally, announce `SIGNED_OUT`.
    ///
    /// The local session is cleared and the event emitted even when the
    /// logout request fails; the failure is still returned.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        let previous = self.session.lock().unwrap_or_else(PoisonError::into_inner).take();

        let result = match previous.as_ref().and_then(Session::access_token) {
            Some(token) => self.logout(&token).await,
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!(error = %e, "gotrue: logout request failed");
        }

        self.events
            .emit(AuthStateChange::new(AuthChangeEvent::SignedOut, None))
            .await;
        result
    }

    async fn logout(&self, token: &Token) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(self.config.endpoint(LOGOUT_PATH))
            .header("apikey", &self.config.api_key)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        // Already-invalid sessions count as signed out.
        if response.status().is_success() || matches!(status, 401 | 403 | 404) {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Response { status, body })
    }

    async fn fetch_user(&self, token: &Token) -> Result<Option<User>, ProviderError> {
        let response = self
            .http
            .get(self.config.endpoint(USER_PATH))
            .header("apikey", &self.config.api_key)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if status != 200 {
            return Err(ProviderError::Response { status, body: text });
        }

        parse_user(&text).map(Some)
    }
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    async fn get_user_for_token(&self, token: &Token) -> Result<Option<User>, ProviderError> {
        self.fetch_user(token).await
    }

    async fn get_user(&self) -> Result<Option<User>, ProviderError> {
        let Some(token) = self.session().as_ref().and_then(Session::access_token) else {
            debug!("gotrue: no session, no user");
            return Ok(None);
        };
        self.fetch_user(&token).await
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        let initial = AuthStateChange::new(AuthChangeEvent::InitialSession, self.session());
        self.events.subscribe_with(Some(initial))
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_user(json: &str) -> Result<User, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(ProviderError::Parse("user response is not an object".into()));
    }
    Ok(User::new(value))
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
