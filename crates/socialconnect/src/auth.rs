//! Auth actions, bracketed by the session store's pending state.

use std::future::Future;

use socialconnect_identity::{AccountProvider, IdentityError, Principal, SignUpRequest};
use socialconnect_session::SessionStore;

use crate::AppError;

/// Runs account operations against the provider while keeping the
/// session store in step.
///
/// Each call marks the session as loading for its whole duration, so the
/// route guard shows a placeholder instead of acting on a session that is
/// about to change. When the call returns, the store has already applied
/// whatever change the provider announced, and the loading flag is off
/// again whether the call succeeded or not.
///
/// Provider failures come back as [`AppError::Identity`] with the
/// provider's message, ready to show next to the form.
pub struct AuthClient<'a, P: AccountProvider> {
    provider: &'a P,
    store: &'a SessionStore,
}

impl<'a, P: AccountProvider> AuthClient<'a, P> {
    /// Borrows the provider and the store it feeds.
    pub fn new(provider: &'a P, store: &'a SessionStore) -> Self {
        Self { provider, store }
    }

    /// Creates an account. `Some` when the provider signed the new user in
    /// straight away, `None` when it waits for email confirmation.
    pub async fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> Result<Option<Principal>, AppError> {
        self.run("sign_up", self.provider.sign_up(request)).await
    }

    /// Signs in with an email or username and a password.
    pub async fn sign_in(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Principal, AppError> {
        self.run(
            "sign_in",
            self.provider.sign_in_with_password(identifier, password),
        )
        .await
    }

    /// Ends the session. The store shows the viewer as anonymous once this
    /// returns `Ok`.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.run("sign_out", self.provider.sign_out()).await
    }

    /// Asks the provider to email a reset link pointing at `redirect_to`.
    pub async fn reset_password(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AppError> {
        self.run(
            "reset_password",
            self.provider.reset_password_for_email(email, redirect_to),
        )
        .await
    }

    /// Sets a new password for the signed-in (or recovering) user.
    pub async fn update_password(&self, password: &str) -> Result<(), AppError> {
        self.run("update_password", self.provider.update_password(password))
            .await
    }

    async fn run<T>(
        &self,
        action: &'static str,
        call: impl Future<Output = Result<T, IdentityError>>,
    ) -> Result<T, AppError> {
        let pending = self.store.begin_pending()?;
        let result = call.await;
        pending.settle().await;

        match &result {
            Ok(_) => tracing::info!(action, "auth action succeeded"),
            Err(e) => tracing::warn!(action, error = %e, "auth action failed"),
        }
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use socialconnect_identity::MemoryProvider;

    use super::*;

    fn provider() -> Arc<MemoryProvider> {
        Arc::new(
            MemoryProvider::new()
                .with_latency(Duration::from_millis(50))
                .with_account("u1", "ada@example.com", "ada", "correct-horse"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_settled_state_shows_principal() {
        let provider = provider();
        let store = SessionStore::initialize(Arc::clone(&provider));
        store.watch().settled().await.unwrap();

        let principal = AuthClient::new(&*provider, &store)
            .sign_in("ada", "correct-horse")
            .await
            .unwrap();

        let state = store.snapshot();
        assert!(!state.loading);
        assert_eq!(state.principal.map(|p| p.id), Some(principal.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_loading_while_in_flight() {
        let provider = provider();
        let store = SessionStore::initialize(Arc::clone(&provider));
        let mut watch = store.watch();
        watch.settled().await.unwrap();

        let auth = AuthClient::new(&*provider, &store);
        let sign_in = auth.sign_in("ada", "correct-horse");
        tokio::pin!(sign_in);

        // Drive the action until it is waiting on the provider.
        tokio::select! {
            _ = &mut sign_in => panic!("sign-in finished before the latency elapsed"),
            state = watch.changed() => assert!(state.unwrap().loading),
        }
        sign_in.await.unwrap();
        assert!(store.snapshot().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_wrong_password_settles_anonymous() {
        let provider = provider();
        let store = SessionStore::initialize(Arc::clone(&provider));
        store.watch().settled().await.unwrap();

        let err = AuthClient::new(&*provider, &store)
            .sign_in("ada", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Identity(IdentityError::InvalidCredentials)
        ));
        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.principal.is_none());
    }
}
