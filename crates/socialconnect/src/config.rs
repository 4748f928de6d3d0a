//! Client configuration.
//!
//! Two groups of settings: where the identity provider lives
//! ([`ProviderConfig`]) and which paths the auth flows navigate between
//! ([`RoutingConfig`]). Both have working defaults, so an unconfigured
//! checkout still boots against placeholder credentials.

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Environment variable holding the identity provider's base URL.
pub const AUTH_URL_VAR: &str = "SOCIALCONNECT_AUTH_URL";
/// Environment variable holding the provider's public (anonymous) key.
pub const AUTH_ANON_KEY_VAR: &str = "SOCIALCONNECT_AUTH_ANON_KEY";
/// Environment variable overriding the origin used in emailed links.
pub const SITE_ORIGIN_VAR: &str = "SOCIALCONNECT_SITE_ORIGIN";

const PLACEHOLDER_URL: &str = "https://placeholder-auth-url.example.com";
const PLACEHOLDER_ANON_KEY: &str = "placeholder-anon-key";

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// Connection settings for the hosted identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: String,
    pub anon_key: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: PLACEHOLDER_URL.to_string(),
            anon_key: PLACEHOLDER_ANON_KEY.to_string(),
        }
    }
}

impl ProviderConfig {
    /// `false` while either setting is still a placeholder. The client
    /// runs either way; real sign-ins only work once this is `true`.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
            && !self.anon_key.is_empty()
            && self.url != PLACEHOLDER_URL
            && self.anon_key != PLACEHOLDER_ANON_KEY
    }
}

// ---------------------------------------------------------------------------
// RoutingConfig
// ---------------------------------------------------------------------------

/// Paths the auth flows send the viewer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// The sign-in page. Denied viewers land here.
    pub sign_in_path: String,
    /// Where sign-in goes when there is no captured destination.
    pub home_path: String,
    /// The page password-reset emails link back to.
    pub reset_password_path: String,
    /// Scheme and host of the deployed client, for links in emails.
    pub site_origin: String,
    /// Optional notice shown on the sign-in page after a denial.
    pub sign_in_message: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            sign_in_path: "/login".to_string(),
            home_path: "/".to_string(),
            reset_password_path: "/reset-password".to_string(),
            site_origin: "http://localhost:5173".to_string(),
            sign_in_message: None,
        }
    }
}

impl RoutingConfig {
    /// Absolute URL the password-reset email should link to.
    pub fn reset_redirect_url(&self) -> String {
        format!(
            "{}{}",
            self.site_origin.trim_end_matches('/'),
            self.reset_password_path
        )
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Everything [`App::boot`](crate::App::boot) needs besides the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub routing: RoutingConfig,
}

impl AppConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to
    /// its value. Unset or empty variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(url) = get(AUTH_URL_VAR) {
            config.provider.url = url;
        }
        if let Some(key) = get(AUTH_ANON_KEY_VAR) {
            config.provider.anon_key = key;
        }
        if let Some(origin) = get(SITE_ORIGIN_VAR) {
            config.routing.site_origin = origin;
        }

        if !config.provider.is_configured() {
            tracing::warn!(
                url_var = AUTH_URL_VAR,
                key_var = AUTH_ANON_KEY_VAR,
                "identity provider not configured, using placeholder credentials"
            );
        }
        config
    }

    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks that every configured path is app-relative.
    ///
    /// # Errors
    /// [`AppError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), AppError> {
        let routing = &self.routing;
        let paths = [
            ("sign_in_path", &routing.sign_in_path),
            ("home_path", &routing.home_path),
            ("reset_password_path", &routing.reset_password_path),
        ];
        for (field, path) in paths {
            if !path.starts_with('/') || path.starts_with("//") {
                return Err(AppError::Config(format!(
                    "{field} must be an app-relative path, got {path:?}"
                )));
            }
        }
        if routing.sign_in_path == routing.home_path {
            return Err(AppError::Config(
                "sign_in_path and home_path must differ".into(),
            ));
        }
        if routing.site_origin.is_empty() {
            return Err(AppError::Config("site_origin must not be empty".into()));
        }
        Ok(())
    }
}
