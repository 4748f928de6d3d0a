//! Error types for the routing layer.

/// Errors raised while building a route table.
///
/// Resolving a path never fails: an unknown path simply has no match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The pattern is not an absolute path, or has an empty or unnamed
    /// segment (`//`, `/:`).
    #[error("invalid route pattern: {0}")]
    InvalidPattern(String),

    /// Another route already uses this name.
    #[error("duplicate route name: {0}")]
    DuplicateRoute(String),
}
