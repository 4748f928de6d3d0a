//! The route guard: may this viewer see this protected page right now?

use socialconnect_session::{SessionState, SessionStatus};

use crate::RedirectRequest;

/// Outcome of evaluating the guard for one protected path.
///
/// ```text
///            ┌──(principal present)──→ Granted
/// Pending ───┤
///            └──(principal absent)───→ Denied(RedirectRequest)
/// ```
///
/// `Pending` is not a redirect: the decision is simply put off until the
/// session has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still loading; render a placeholder.
    Pending,
    /// Render the protected page.
    Granted,
    /// Navigate (replacing the current entry) to the sign-in page.
    Denied(RedirectRequest),
}

impl GuardDecision {
    /// True while the session is loading and nothing should be decided yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// The redirect to perform, if access was denied.
    pub fn redirect(&self) -> Option<&RedirectRequest> {
        match self {
            Self::Denied(request) => Some(request),
            _ => None,
        }
    }
}

/// Decides access to protected pages from a session snapshot.
///
/// Stateless apart from its configuration: the same snapshot and path
/// always give the same decision. Callers evaluate it on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    sign_in_path: String,
    message: Option<String>,
}

impl RouteGuard {
    /// A guard that sends anonymous viewers to `sign_in_path`.
    pub fn new(sign_in_path: impl Into<String>) -> Self {
        Self {
            sign_in_path: sign_in_path.into(),
            message: None,
        }
    }

    /// Attaches a notice for the sign-in page to every denial.
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Where denied viewers are sent.
    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Evaluates access to `requested_path`, which the caller has already
    /// resolved to a protected route.
    pub fn evaluate(&self, session: &SessionState, requested_path: &str) -> GuardDecision {
        match session.status() {
            SessionStatus::Unknown => GuardDecision::Pending,
            SessionStatus::Anonymous => {
                tracing::debug!(
                    path = requested_path,
                    target = %self.sign_in_path,
                    "access denied, redirecting to sign-in"
                );
                GuardDecision::Denied(RedirectRequest::denied(
                    self.sign_in_path.clone(),
                    requested_path,
                    self.message.clone(),
                ))
            }
            SessionStatus::Authenticated(_) => GuardDecision::Granted,
        }
    }
}
