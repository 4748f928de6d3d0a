//! Identity types: who is signed in, as the client knows it.
//!
//! None of these are ever mutated in place. When the provider reports a
//! change, the whole [`Principal`] is replaced.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// The provider's identifier for a user account.
///
/// Opaque to the client: usually a UUID, but nothing here depends on that.
/// `#[serde(transparent)]` keeps it a bare string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A provider-issued session token.
///
/// The client never parses it; it is only handed back to the provider.
/// `Debug` is redacted so a principal can be logged without leaking the
/// token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token, for passing back to the provider.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// The signed-in user as known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account identifier.
    pub id: UserId,
    /// Account email address.
    pub email: String,
    /// Session token issued at sign-in (or at the last refresh).
    pub token: SessionToken,
}

impl Principal {
    /// Creates a principal from its parts.
    pub fn new(
        id: impl Into<UserId>,
        email: impl Into<String>,
        token: SessionToken,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            token,
        }
    }
}

// ---------------------------------------------------------------------------
// Change notifications
// ---------------------------------------------------------------------------

/// Why the provider pushed a session change.
///
/// The session store treats every event the same way (replace the
/// principal); the kind is carried for logging and for consumers that
/// want to react to specific transitions.
///
/// There is no "initial session" event. The session a client starts with
/// comes from [`IdentityProvider::current_session`](crate::IdentityProvider::current_session),
/// and the push channel only ever reports changes after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    /// A user signed in (here or in another tab).
    SignedIn,
    /// The user signed out (here or elsewhere).
    SignedOut,
    /// The session token was refreshed.
    TokenRefreshed,
    /// Account details (email, password) changed.
    UserUpdated,
    /// The user followed a password-recovery link.
    PasswordRecovery,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        };
        f.write_str(name)
    }
}

/// A single push notification from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    /// What happened.
    pub event: AuthEvent,
    /// The session after the change. `None` means signed out.
    pub principal: Option<Principal>,
}

impl AuthChange {
    /// Shorthand for a change that leaves nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            event: AuthEvent::SignedOut,
            principal: None,
        }
    }
}
