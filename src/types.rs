//! Session types — opaque provider values and auth-change events.
//!
//! DESIGN
//! ======
//! `User` and `Session` wrap `serde_json::Value` transparently. The sync logic
//! stores and forwards them but never looks inside; only the provider adapter
//! reads `access_token` out of a `Session`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// USER
// =============================================================================

/// Authenticated principal as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(serde_json::Value);

impl User {
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for User {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// =============================================================================
// TOKEN
// =============================================================================

/// Bearer credential. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Provider session bundle (token plus metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(serde_json::Value);

impl Session {
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// The bearer token carried by the session, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<Token> {
        self.0
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(Token::from)
    }
}

impl From<serde_json::Value> for Session {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// =============================================================================
// AUTH CHANGE EVENT
// =============================================================================

/// Provider event tag. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
    MfaChallengeVerified,
    Other(String),
}

impl AuthChangeEvent {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
            Self::MfaChallengeVerified => "MFA_CHALLENGE_VERIFIED",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for AuthChangeEvent {
    fn from(tag: &str) -> Self {
        match tag {
            "INITIAL_SESSION" => Self::InitialSession,
            "SIGNED_IN" => Self::SignedIn,
            "SIGNED_OUT" => Self::SignedOut,
            "TOKEN_REFRESHED" => Self::TokenRefreshed,
            "USER_UPDATED" => Self::UserUpdated,
            "PASSWORD_RECOVERY" => Self::PasswordRecovery,
            "MFA_CHALLENGE_VERIFIED" => Self::MfaChallengeVerified,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuthChangeEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuthChangeEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from(tag.as_str()))
    }
}

// =============================================================================
// AUTH STATE CHANGE
// =============================================================================

/// One provider auth-state change. Serializes to the session endpoint body:
/// `{"event": "...", "session": {...} | null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

impl AuthStateChange {
    #[must_use]
    pub fn new(event: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
