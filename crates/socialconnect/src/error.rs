//! Unified error type for the SocialConnect client.

use socialconnect_identity::IdentityError;
use socialconnect_router::RouteError;
use socialconnect_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically, so callers of [`App`](crate::App) only ever
/// match on this one type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The identity provider refused or failed an account operation.
    /// The message is meant for the form that triggered it.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The session store has been torn down.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The route table could not be built.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The configuration is malformed or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
