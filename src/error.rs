//! Error types for provider calls and session sync.

// =============================================================================
// PROVIDER ERROR
// =============================================================================

/// Errors produced by an `AuthProvider`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// A configuration value is missing or malformed.
    #[error("provider config invalid: {0}")]
    Config(String),

    /// The HTTP request to the auth server failed.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The auth server returned a non-success HTTP status.
    #[error("provider response error: status {status}")]
    Response { status: u16, body: String },

    /// The auth server response body could not be deserialized.
    #[error("provider response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ProviderError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_PROVIDER_CONFIG",
            Self::Request(_) => "E_PROVIDER_REQUEST",
            Self::Response { .. } => "E_PROVIDER_RESPONSE",
            Self::Parse(_) => "E_PROVIDER_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }

    /// The auth server refused the session (401/403).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Response { status: 401 | 403, .. })
    }
}

// =============================================================================
// SYNC ERROR
// =============================================================================

/// Errors produced while syncing session state.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A configuration value is missing or malformed.
    #[error("config invalid: {0}")]
    Config(String),

    /// The session endpoint could not be reached.
    #[error("session request failed: {0}")]
    SessionRequest(String),

    /// The session endpoint returned a non-success HTTP status.
    #[error("session endpoint error: status {status}")]
    SessionResponse { status: u16 },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl SyncError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.error_code(),
            Self::Config(_) => "E_CONFIG",
            Self::SessionRequest(_) => "E_SESSION_REQUEST",
            Self::SessionResponse { .. } => "E_SESSION_RESPONSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.retryable(),
            Self::SessionRequest(_) => true,
            Self::SessionResponse { status } => matches!(status, 429 | 500..=599),
            Self::Config(_) | Self::HttpClientBuild(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
