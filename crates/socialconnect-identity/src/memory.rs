//! An identity provider that lives entirely in process.
//!
//! `MemoryProvider` implements the full provider contract (accounts,
//! sessions, push notifications) against a few in-memory collections. It
//! is what the tests and the demo run against, and it doubles as a
//! reference for what a hosted-provider adapter has to do.
//!
//! It can also play "the rest of the world": [`MemoryProvider::force_sign_out`]
//! and [`MemoryProvider::refresh_token`] act like another tab or device
//! changing the session, and [`MemoryProvider::set_unavailable`] simulates
//! an outage.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;

use crate::{
    AccountProvider, AuthChange, AuthEvent, IdentityError, IdentityProvider,
    Principal, SessionToken, SignUpRequest, Subscription, UserId,
};

/// Shortest password the provider accepts on sign-up or update.
const MIN_PASSWORD_LEN: usize = 6;

/// A stored account.
#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: String,
    username: String,
    password: String,
}

impl Account {
    /// Matches an email (case-insensitive) or an exact username.
    fn matches(&self, identifier: &str) -> bool {
        self.email.eq_ignore_ascii_case(identifier) || self.username == identifier
    }
}

#[derive(Debug, Default)]
struct Inner {
    accounts: Vec<Account>,
    current: Option<Principal>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<AuthChange>)>,
    next_subscription: u64,
    next_user: u64,
    unavailable: bool,
    reset_requests: Vec<(String, String)>,
}

impl Inner {
    fn check_available(&self) -> Result<(), IdentityError> {
        if self.unavailable {
            Err(IdentityError::Unavailable("provider is offline".into()))
        } else {
            Ok(())
        }
    }

    /// Sends a change to every live subscriber, forgetting the ones whose
    /// receiver has been dropped.
    fn broadcast(&mut self, change: AuthChange) {
        self.subscribers
            .retain(|(_, tx)| tx.send(change.clone()).is_ok());
        tracing::debug!(
            event = %change.event,
            subscribers = self.subscribers.len(),
            "broadcast session change"
        );
    }

    /// Starts a fresh session for `account` and announces it as `event`.
    fn start_session(&mut self, account: &Account, event: AuthEvent) -> Principal {
        let principal = Principal {
            id: account.id.clone(),
            email: account.email.clone(),
            token: SessionToken::new(generate_token()),
        };
        self.current = Some(principal.clone());
        self.broadcast(AuthChange {
            event,
            principal: Some(principal.clone()),
        });
        principal
    }
}

/// In-process [`IdentityProvider`] and [`AccountProvider`].
///
/// Every async call first waits for the configured latency (zero by
/// default), using `tokio::time` so tests can run on paused virtual time.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    inner: Mutex<Inner>,
    latency: Duration,
    confirm_email: bool,
}

impl MemoryProvider {
    /// Creates an empty provider: no accounts, nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulated round-trip time for every async call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes sign-up wait for email confirmation: the account is created
    /// but nobody is signed in, and [`AccountProvider::sign_up`] returns
    /// `None`.
    pub fn with_email_confirmation(mut self) -> Self {
        self.confirm_email = true;
        self
    }

    /// Registers an account up front.
    pub fn with_account(
        self,
        id: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> Self {
        self.lock().accounts.push(Account {
            id: UserId::from(id),
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Makes every call fail with [`IdentityError::Unavailable`] (or
    /// succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Marks an existing account as signed in without notifying anyone,
    /// the way a session persisted by an earlier visit would be.
    pub fn restore_session(
        &self,
        identifier: &str,
    ) -> Result<Principal, IdentityError> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .iter()
            .find(|a| a.matches(identifier))
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        let principal = Principal {
            id: account.id,
            email: account.email,
            token: SessionToken::new(generate_token()),
        };
        inner.current = Some(principal.clone());
        Ok(principal)
    }

    /// Ends the session as if the user signed out on another device.
    pub fn force_sign_out(&self) {
        let mut inner = self.lock();
        inner.current = None;
        inner.broadcast(AuthChange::signed_out());
    }

    /// Issues a new token for the current session and announces it.
    ///
    /// Returns the refreshed principal, or `None` if nobody is signed in.
    pub fn refresh_token(&self) -> Option<Principal> {
        let mut inner = self.lock();
        let mut principal = inner.current.clone()?;
        principal.token = SessionToken::new(generate_token());
        inner.current = Some(principal.clone());
        inner.broadcast(AuthChange {
            event: AuthEvent::TokenRefreshed,
            principal: Some(principal.clone()),
        });
        Some(principal)
    }

    /// Replaces the current session with `change.principal` and pushes
    /// `change` to every subscriber.
    pub fn emit(&self, change: AuthChange) {
        let mut inner = self.lock();
        inner.current = change.principal.clone();
        inner.broadcast(change);
    }

    /// The provider's own view of the current session.
    pub fn current(&self) -> Option<Principal> {
        self.lock().current.clone()
    }

    /// Number of subscriptions still being listened to.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|(_, tx)| !tx.is_closed());
        inner.subscribers.len()
    }

    /// Opens the password-reset link sent to `email`, as the user would
    /// from their inbox.
    ///
    /// A hosted provider signs the user in through the link itself: the
    /// page it lands on gets a short-lived recovery session, which is what
    /// lets an anonymous viewer call
    /// [`update_password`](AccountProvider::update_password) afterwards.
    /// This does the same: it starts a session for the account and
    /// announces it as [`AuthEvent::PasswordRecovery`].
    ///
    /// # Errors
    /// [`IdentityError::Rejected`] if no reset was requested for `email`,
    /// or if the address has no account (the request itself still
    /// succeeded, so as not to reveal that).
    pub fn follow_reset_link(&self, email: &str) -> Result<Principal, IdentityError> {
        let mut inner = self.lock();
        inner.check_available()?;

        let requested = inner
            .reset_requests
            .iter()
            .any(|(requested, _)| requested.eq_ignore_ascii_case(email));
        let account = inner
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned();
        let Some(account) = account.filter(|_| requested) else {
            return Err(IdentityError::Rejected(
                "Email link is invalid or has expired".into(),
            ));
        };

        tracing::info!(user_id = %account.id, "password recovery session started");
        Ok(inner.start_session(&account, AuthEvent::PasswordRecovery))
    }

    /// Every `(email, redirect_to)` pair passed to
    /// [`AccountProvider::reset_password_for_email`], oldest first.
    pub fn password_reset_requests(&self) -> Vec<(String, String)> {
        self.lock().reset_requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl IdentityProvider for MemoryProvider {
    async fn current_session(&self) -> Result<Option<Principal>, IdentityError> {
        self.round_trip().await;
        let inner = self.lock();
        inner.check_available()?;
        Ok(inner.current.clone())
    }

    fn subscribe(&self) -> Result<Subscription, IdentityError> {
        let mut inner = self.lock();
        inner.check_available()?;
        let (tx, rx) = mpsc::unbounded_channel();
        inner.next_subscription += 1;
        let id = inner.next_subscription;
        inner.subscribers.push((id, tx));
        tracing::debug!(subscription = id, "subscriber added");
        Ok(Subscription::new(id, rx))
    }
}

impl AccountProvider for MemoryProvider {
    async fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> Result<Option<Principal>, IdentityError> {
        self.round_trip().await;
        let mut inner = self.lock();
        inner.check_available()?;

        if inner
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(IdentityError::Rejected("User already registered".into()));
        }
        if inner.accounts.iter().any(|a| a.username == request.username) {
            return Err(IdentityError::Rejected("Username already taken".into()));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        inner.next_user += 1;
        let account = Account {
            id: UserId(format!("user-{}", inner.next_user)),
            email: request.email,
            username: request.username,
            password: request.password,
        };
        inner.accounts.push(account.clone());
        tracing::info!(user_id = %account.id, "account created");

        if self.confirm_email {
            tracing::debug!(user_id = %account.id, "sign-up awaiting email confirmation");
            return Ok(None);
        }
        Ok(Some(inner.start_session(&account, AuthEvent::SignedIn)))
    }

    async fn sign_in_with_password(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Principal, IdentityError> {
        self.round_trip().await;
        let mut inner = self.lock();
        inner.check_available()?;

        let account = inner
            .accounts
            .iter()
            .find(|a| a.matches(identifier) && a.password == password)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        Ok(inner.start_session(&account, AuthEvent::SignedIn))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.round_trip().await;
        let mut inner = self.lock();
        inner.check_available()?;
        inner.current = None;
        inner.broadcast(AuthChange::signed_out());
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError> {
        self.round_trip().await;
        let mut inner = self.lock();
        inner.check_available()?;
        // Recorded whether or not the account exists, so callers can't
        // tell which emails are registered.
        inner
            .reset_requests
            .push((email.to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<(), IdentityError> {
        self.round_trip().await;
        let mut inner = self.lock();
        inner.check_available()?;

        let current = inner.current.clone().ok_or(IdentityError::NotAuthenticated)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let account = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == current.id)
            .ok_or(IdentityError::NotAuthenticated)?;
        account.password = password.to_string();

        inner.broadcast(AuthChange {
            event: AuthEvent::UserUpdated,
            principal: Some(current),
        });
        Ok(())
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_32_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_account_matches_email_case_insensitively() {
        let account = Account {
            id: UserId::from("u1"),
            email: "Ada@Example.com".into(),
            username: "ada".into(),
            password: "pw".into(),
        };
        assert!(account.matches("ada@example.com"));
        assert!(account.matches("ada"));
        assert!(!account.matches("ADA"));
    }
}
