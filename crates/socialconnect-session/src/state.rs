//! The session snapshot handed to every reader.

use socialconnect_identity::Principal;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// What the client currently knows about the session.
///
/// Always replaced as a whole, never patched field by field, so a reader
/// can't see a principal from one update paired with the loading flag of
/// another.
///
/// While `loading` is `true` the principal must be treated as unknown.
/// Use [`SessionState::status`] rather than reading the fields directly
/// and the compiler makes you handle that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// The signed-in user, if any.
    pub principal: Option<Principal>,
    /// `true` until the provider has answered, and while an auth action
    /// is in flight.
    pub loading: bool,
}

impl SessionState {
    /// The state every store starts in: nothing known yet.
    pub fn initial() -> Self {
        Self {
            principal: None,
            loading: true,
        }
    }

    /// A settled state with the given principal.
    pub fn settled(principal: Option<Principal>) -> Self {
        Self {
            principal,
            loading: false,
        }
    }

    /// Interprets the state for a consumer.
    pub fn status(&self) -> SessionStatus<'_> {
        match (&self.principal, self.loading) {
            (_, true) => SessionStatus::Unknown,
            (None, false) => SessionStatus::Anonymous,
            (Some(principal), false) => SessionStatus::Authenticated(principal),
        }
    }

    /// `true` only when settled with a principal.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.status(), SessionStatus::Authenticated(_))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// A reader's view of [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus<'a> {
    /// Still loading; neither signed in nor signed out may be assumed.
    Unknown,
    /// Settled, nobody signed in.
    Anonymous,
    /// Settled, this user is signed in.
    Authenticated(&'a Principal),
}
