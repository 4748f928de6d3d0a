//! Error types for the session layer.

/// Errors from talking to the session store.
///
/// Provider failures are not in here on purpose: the store absorbs them
/// and reports "signed out" instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The store has been torn down, so it no longer accepts commands
    /// and will never publish another state.
    #[error("session store is closed")]
    Closed,
}
