//! Sync configuration parsed from environment variables.

use crate::error::SyncError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_ENDPOINT: &str = "/api/_supabase/session";

/// Login redirect policy. `login: None` disables the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectConfig {
    pub login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Origin the session endpoint is resolved against.
    pub base_url: String,
    pub session_endpoint: String,
    pub redirect: Option<RedirectConfig>,
    /// No timeout is applied when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            session_endpoint: DEFAULT_SESSION_ENDPOINT.to_owned(),
            redirect: None,
            request_timeout_secs: None,
        }
    }
}

impl SyncConfig {
    /// Read a `.env` file if one exists, then build from the environment.
    pub fn load() -> Result<Self, SyncError> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Build typed sync config from environment variables.
    ///
    /// Optional:
    /// - `SESSION_SYNC_BASE_URL`: default `http://localhost:3000`
    /// - `SESSION_SYNC_ENDPOINT`: default `/api/_supabase/session`
    /// - `SESSION_SYNC_LOGIN_PATH`: enables the login redirect guard
    /// - `SESSION_SYNC_REQUEST_TIMEOUT_SECS`: no timeout when absent
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("SESSION_SYNC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let session_endpoint =
            lookup("SESSION_SYNC_ENDPOINT").unwrap_or_else(|| DEFAULT_SESSION_ENDPOINT.to_owned());
        require_path("SESSION_SYNC_ENDPOINT", &session_endpoint)?;

        let login = lookup("SESSION_SYNC_LOGIN_PATH")
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty());
        if let Some(path) = &login {
            require_path("SESSION_SYNC_LOGIN_PATH", path)?;
        }

        let request_timeout_secs = match lookup("SESSION_SYNC_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                SyncError::Config(format!("SESSION_SYNC_REQUEST_TIMEOUT_SECS is not a number: {raw}"))
            })?),
            None => None,
        };

        Ok(Self {
            base_url,
            session_endpoint,
            redirect: login.map(|login| RedirectConfig { login: Some(login) }),
            request_timeout_secs,
        })
    }

    /// Configured login path, if the redirect guard should be installed.
    #[must_use]
    pub fn login_path(&self) -> Option<&str> {
        self.redirect
            .as_ref()
            .and_then(|r| r.login.as_deref())
            .filter(|path| !path.is_empty())
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(RedirectConfig { login: Some(path.into()) });
        self
    }

    /// Absolute URL of the session endpoint.
    #[must_use]
    pub fn session_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.session_endpoint)
    }
}

fn require_path(key: &str, value: &str) -> Result<(), SyncError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(SyncError::Config(format!("{key} must start with '/': {value}")))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
