//! The identity-provider boundary.
//!
//! SocialConnect talks to a hosted auth service (credential storage,
//! password hashing, token issuance all live there). The client only needs
//! two things from it to know who is signed in:
//!
//! 1. a one-shot "what is the current session?" call, and
//! 2. a push channel that fires whenever the session changes.
//!
//! Those form [`IdentityProvider`]. The account operations the sign-in,
//! sign-up and password screens use live in [`AccountProvider`]; the
//! session store never calls them, it only sees the notifications they
//! cause.

use std::future::Future;

use tokio::sync::mpsc;

use crate::{AuthChange, IdentityError, Principal};

/// Source of truth for "who is signed in".
///
/// `Send + Sync + 'static` because the session store shares the provider
/// with its writer task through an `Arc`.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Fetches the current session, if any.
    ///
    /// Completes on the provider's own schedule. The client sets no timeout
    /// of its own.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Principal>, IdentityError>> + Send;

    /// Opens a push channel for session changes.
    ///
    /// Notifications are delivered in the order the provider emits them.
    /// Dropping the returned [`Subscription`] unsubscribes.
    fn subscribe(&self) -> Result<Subscription, IdentityError>;
}

/// Account operations behind the auth screens.
///
/// Every successful call that changes the session must emit the matching
/// [`AuthChange`] on all live subscriptions *before* returning. The session
/// store relies on that ordering to show the new session as soon as the
/// action settles.
pub trait AccountProvider: IdentityProvider {
    /// Creates an account. Returns the new session when the provider signs
    /// the user in straight away, or `None` when it waits for the email to
    /// be confirmed.
    fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> impl Future<Output = Result<Option<Principal>, IdentityError>> + Send;

    /// Signs in with a password. `identifier` is an email or a username.
    fn sign_in_with_password(
        &self,
        identifier: &str,
        password: &str,
    ) -> impl Future<Output = Result<Principal, IdentityError>> + Send;

    /// Ends the current session.
    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Sends a password-reset link that lands on `redirect_to`.
    fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Changes the signed-in user's password.
    fn update_password(
        &self,
        password: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

/// Everything the provider needs to create an account.
///
/// Field validation (lengths, allowed characters) happens in the form
/// before this is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A live subscription to session changes.
///
/// This is the receiving half of the provider's push channel. It is the
/// unsubscribe handle too: once it is dropped, the provider's next send
/// fails and the provider forgets the subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    changes: mpsc::UnboundedReceiver<AuthChange>,
}

impl Subscription {
    /// Wraps the receiving end of a provider channel.
    pub fn new(id: u64, changes: mpsc::UnboundedReceiver<AuthChange>) -> Self {
        Self { id, changes }
    }

    /// Provider-assigned subscription number, for logging.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next change.
    ///
    /// Returns `None` once the provider has closed the channel.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        self.changes.recv().await
    }

    /// Stops listening. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {
        tracing::debug!(subscription = self.id, "unsubscribed from session changes");
    }
}
