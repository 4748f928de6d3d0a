//! Error types for the identity layer.

/// Errors returned by an identity provider.
///
/// The session store never lets these escape: a failed session fetch is
/// logged and treated as "nobody signed in". Auth actions (sign-in,
/// password reset, ...) do surface them, because the form that triggered
/// the action has to show what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The provider could not be reached or failed internally.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// The identifier/password pair did not match an account.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The operation needs a signed-in user and there is none.
    #[error("no user is signed in")]
    NotAuthenticated,

    /// The provider refused the request (duplicate email, weak password, ...).
    /// The string is the provider's own message.
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rejected_is_provider_message_verbatim() {
        let err = IdentityError::Rejected("User already registered".into());
        assert_eq!(err.to_string(), "User already registered");
    }

    #[test]
    fn test_display_unavailable_includes_cause() {
        let err = IdentityError::Unavailable("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
