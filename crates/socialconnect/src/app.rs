//! The application shell: session store, route guard and history wired
//! together the way the client's pages use them.
//!
//! # Rendering model
//!
//! There is no UI here. A "render" is a call to [`App::view`], which looks
//! at the current history entry and answers with a [`View`]. Public pages
//! render straight away. Protected pages go through the [`RouteGuard`],
//! which may answer "loading" or send the viewer to sign in.
//!
//! Nothing re-renders on its own. When the session may have changed (a
//! provider notification, another device signing out), the caller awaits
//! [`App::next_view`] or [`App::settled_view`] and gets the fresh view.

use std::sync::Arc;

use socialconnect_identity::{AccountProvider, SignUpRequest};
use socialconnect_router::{
    GuardDecision, History, RedirectRequest, RouteGuard, RouteMatch, RouteTable,
    post_sign_in_destination,
};
use socialconnect_session::{SessionState, SessionStatus, SessionStore, SessionWatch};

use crate::{AppConfig, AppError, AuthClient};

/// Notice shown on the sign-in page after a password change.
pub const PASSWORD_UPDATED_NOTICE: &str =
    "Password updated successfully. Please sign in with your new password.";

/// Notice shown on the sign-in page when sign-up awaits email confirmation.
pub const CONFIRM_EMAIL_NOTICE: &str =
    "Registration successful. Please check your email to confirm your account.";

/// What the shell renders for the current history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// A page the viewer may see.
    Page(RouteMatch),
    /// A protected page while the session is still loading.
    Loading,
    /// No route matches the path.
    NotFound(String),
}

impl View {
    /// Name of the rendered route, if a page is rendered.
    pub fn route_name(&self) -> Option<&str> {
        match self {
            Self::Page(route) => Some(&route.name),
            _ => None,
        }
    }

    /// True for the placeholder shown while the session is loading.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A running SocialConnect client.
///
/// ```text
///  navigate() ──→ History ──→ view() ──→ RouteTable::resolve
///                   ▲                        │ protected?
///                   │ replace on denial      ▼
///                   └──────────────── RouteGuard::evaluate ◄── SessionWatch
///                                                                  ▲
///  sign_in() / sign_out() ──→ AuthClient ──→ provider ──→ SessionStore
/// ```
///
/// Every [`view`](Self::view) evaluates the guard again with the latest
/// session snapshot. After a session change, call
/// [`next_view`](Self::next_view) or [`settled_view`](Self::settled_view)
/// to re-render.
pub struct App<P: AccountProvider> {
    provider: Arc<P>,
    store: SessionStore,
    watch: SessionWatch,
    routes: RouteTable,
    guard: RouteGuard,
    history: History,
    config: AppConfig,
}

impl<P: AccountProvider> App<P> {
    /// Starts the client at `entry_path`.
    ///
    /// Must be called from within a Tokio runtime: it starts the session
    /// store, which begins loading in the background. The first
    /// [`view`](Self::view) of a protected page is therefore
    /// [`View::Loading`].
    ///
    /// # Errors
    /// [`AppError::Config`] if the configuration is invalid or the sign-in
    /// path is not a public route.
    pub fn boot(
        provider: Arc<P>,
        config: AppConfig,
        entry_path: &str,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let routes = RouteTable::social();
        match routes.resolve(&config.routing.sign_in_path) {
            Some(route) if !route.is_protected() => {}
            _ => {
                return Err(AppError::Config(format!(
                    "sign-in path {:?} is not a public route",
                    config.routing.sign_in_path
                )));
            }
        }

        let guard = RouteGuard::new(config.routing.sign_in_path.clone())
            .with_message(config.routing.sign_in_message.clone());
        let store = SessionStore::initialize(Arc::clone(&provider));
        let watch = store.watch();

        tracing::info!(
            entry = entry_path,
            provider_configured = config.provider.is_configured(),
            "client booted"
        );

        Ok(Self {
            provider,
            store,
            watch,
            routes,
            guard,
            history: History::new(entry_path),
            config,
        })
    }

    // -----------------------------------------------------------------------
    // Rendering and navigation
    // -----------------------------------------------------------------------

    /// Renders the current history entry.
    ///
    /// A denied protected page is replaced in history by the sign-in page,
    /// carrying the redirect state, and the sign-in page is rendered.
    pub fn view(&mut self) -> View {
        let path = self.history.current_path().to_string();
        let Some(route) = self.routes.resolve(&path) else {
            tracing::debug!(path = %path, "no route matches");
            return View::NotFound(path);
        };
        if !route.is_protected() {
            return View::Page(route);
        }

        match self.guard.evaluate(&self.watch.current(), &path) {
            GuardDecision::Pending => View::Loading,
            GuardDecision::Granted => View::Page(route),
            GuardDecision::Denied(redirect) => {
                let target = redirect.target_path.clone();
                tracing::info!(from = %path, to = %target, "redirecting to sign-in");
                self.history.replace(target.clone(), Some(redirect));
                match self.routes.resolve(&target) {
                    Some(page) => View::Page(page),
                    None => View::NotFound(target),
                }
            }
        }
    }

    /// Pushes `path` onto history and renders it.
    pub fn navigate(&mut self, path: &str) -> View {
        self.history.push(path, None);
        self.view()
    }

    /// Replaces the current entry with `path` and renders it.
    pub fn navigate_replace(&mut self, path: &str) -> View {
        self.history.replace(path, None);
        self.view()
    }

    /// Goes back one entry, if there is one, and renders.
    pub fn back(&mut self) -> View {
        self.history.back();
        self.view()
    }

    /// Goes forward one entry, if there is one, and renders.
    pub fn forward(&mut self) -> View {
        self.history.forward();
        self.view()
    }

    /// Waits for the next session change, then renders.
    ///
    /// # Errors
    /// [`AppError::Session`] if the store has stopped.
    pub async fn next_view(&mut self) -> Result<View, AppError> {
        self.watch.changed().await?;
        Ok(self.view())
    }

    /// Waits until the session is no longer loading, then renders.
    pub async fn settled_view(&mut self) -> Result<View, AppError> {
        self.watch.settled().await?;
        Ok(self.view())
    }

    // -----------------------------------------------------------------------
    // Auth actions
    // -----------------------------------------------------------------------

    /// Signs in and goes to the page the viewer was denied, or home.
    ///
    /// The redirect state is only consumed on success, so a failed attempt
    /// can be retried and still land on the original page.
    pub async fn sign_in(
        &mut self,
        identifier: &str,
        password: &str,
    ) -> Result<View, AppError> {
        self.auth().sign_in(identifier, password).await?;

        let state = self.history.take_state();
        let destination =
            post_sign_in_destination(state.as_ref(), &self.config.routing.home_path);
        Ok(self.navigate_replace(&destination))
    }

    /// Creates an account. Goes home when the provider signed the user in,
    /// otherwise to the sign-in page with a confirmation notice.
    pub async fn sign_up(&mut self, request: SignUpRequest) -> Result<View, AppError> {
        let session = self.auth().sign_up(request).await?;

        if session.is_some() {
            let home = self.config.routing.home_path.clone();
            return Ok(self.navigate_replace(&home));
        }
        let sign_in = self.config.routing.sign_in_path.clone();
        self.history.push(
            sign_in.clone(),
            Some(RedirectRequest::notice(sign_in, CONFIRM_EMAIL_NOTICE)),
        );
        Ok(self.view())
    }

    /// Signs out and goes to the sign-in page. Never fails: a provider
    /// error is logged and the viewer is sent to sign-in regardless.
    pub async fn sign_out(&mut self) -> View {
        if let Err(e) = self.auth().sign_out().await {
            tracing::error!(error = %e, "sign-out failed");
        }
        let sign_in = self.config.routing.sign_in_path.clone();
        self.navigate(&sign_in)
    }

    /// Emails a reset link that lands on the reset-password page.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let redirect_to = self.config.routing.reset_redirect_url();
        self.auth().reset_password(email, &redirect_to).await
    }

    /// Changes the password, then sends the viewer to sign in again with
    /// a notice.
    ///
    /// Needs a session. A viewer who forgot their password gets one by
    /// opening the reset link, which makes the provider start a recovery
    /// session before the update-password page is shown.
    pub async fn update_password(&mut self, password: &str) -> Result<View, AppError> {
        self.auth().update_password(password).await?;

        let sign_in = self.config.routing.sign_in_path.clone();
        self.history.push(
            sign_in.clone(),
            Some(RedirectRequest::notice(sign_in, PASSWORD_UPDATED_NOTICE)),
        );
        Ok(self.view())
    }

    /// Auth actions against this app's provider and store.
    pub fn auth(&self) -> AuthClient<'_, P> {
        AuthClient::new(self.provider.as_ref(), &self.store)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The latest session snapshot.
    pub fn session(&self) -> SessionState {
        self.watch.current()
    }

    /// Link to the signed-in user's own profile.
    pub fn profile_path(&self) -> Option<String> {
        match self.watch.current().status() {
            SessionStatus::Authenticated(principal) => {
                Some(format!("/profile/{}", principal.id))
            }
            _ => None,
        }
    }

    /// The notice attached to the current entry, for the sign-in page.
    pub fn notice(&self) -> Option<&str> {
        self.history
            .current_state()
            .and_then(|state| state.message.as_deref())
    }

    /// Path of the current history entry.
    ///
    /// After a denied [`view`](Self::view) this is already the sign-in
    /// path, because the denial replaced the entry.
    pub fn current_path(&self) -> &str {
        self.history.current_path()
    }

    /// The navigation history, including each entry's redirect state.
    ///
    /// Read-only: navigate through [`navigate`](Self::navigate),
    /// [`back`](Self::back) and friends so every move is re-rendered
    /// through the guard.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The route table this app resolves paths against.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The configuration the app was booted with, after validation.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The identity provider shared with the session store.
    ///
    /// Calling account operations on it directly bypasses the pending
    /// bracket that [`auth`](Self::auth) adds. The store still applies the
    /// resulting notifications, but the guard never sees a loading phase.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Stops mirroring the provider and releases the subscription.
    pub async fn shutdown(self) {
        self.store.teardown().await;
        tracing::info!("client shut down");
    }
}
