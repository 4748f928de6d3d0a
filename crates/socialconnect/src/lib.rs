//! # SocialConnect
//!
//! Client core for the SocialConnect social network.
//!
//! The client keeps one question answered at all times (*who is signed
//! in?*) and uses the answer to decide which pages the viewer may see.
//! Sign-in, sign-up and the password flows are thin wrappers around a
//! hosted identity provider; the client never handles credentials beyond
//! passing them through.
//!
//! ## Crates
//!
//! ```text
//! socialconnect (this crate)  ← App shell, config, auth actions, telemetry
//!     ↕
//! socialconnect-router        ← route table, route guard, history
//!     ↕
//! socialconnect-session       ← session store mirroring the provider
//!     ↕
//! socialconnect-identity      ← principal types, provider seam
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use socialconnect::prelude::*;
//!
//! # async fn run() -> Result<(), AppError> {
//! let provider = Arc::new(MemoryProvider::new());
//! let mut app = App::boot(provider, AppConfig::from_env(), "/messages")?;
//!
//! // Loading at first, then the sign-in page once the session settles.
//! let view = app.settled_view().await?;
//! assert_eq!(view.route_name(), Some("login"));
//! # Ok(())
//! # }
//! ```

mod app;
mod auth;
mod config;
mod error;
pub mod telemetry;

pub use app::{App, CONFIRM_EMAIL_NOTICE, PASSWORD_UPDATED_NOTICE, View};
pub use auth::AuthClient;
pub use config::{
    AUTH_ANON_KEY_VAR, AUTH_URL_VAR, AppConfig, ProviderConfig, RoutingConfig,
    SITE_ORIGIN_VAR,
};
pub use error::AppError;

pub use socialconnect_identity as identity;
pub use socialconnect_router as router;
pub use socialconnect_session as session;

/// Everything a page or a binary usually needs.
pub mod prelude {
    pub use crate::{App, AppConfig, AppError, AuthClient, View};
    pub use socialconnect_identity::{
        AccountProvider, IdentityError, IdentityProvider, MemoryProvider, Principal,
        SignUpRequest,
    };
    pub use socialconnect_router::{GuardDecision, RedirectRequest, RouteMatch};
    pub use socialconnect_session::{SessionState, SessionStatus};
}
