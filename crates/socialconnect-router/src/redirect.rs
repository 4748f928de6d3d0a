//! Redirect state carried to the sign-in page.

use serde::{Deserialize, Serialize};

/// Why the viewer ended up on the sign-in page, and where to go next.
///
/// Created by the guard on denial (with `original_path` set) or by a flow
/// that wants to show a notice on the sign-in page (with `message` set).
/// It rides along with the history entry it was attached to and is
/// consumed once by the sign-in flow. It is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRequest {
    /// Where the viewer is being sent (the sign-in page).
    pub target_path: String,
    /// The protected path that was denied, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
    /// A notice for the sign-in page ("Please sign in to continue").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RedirectRequest {
    /// A redirect caused by denied access to `original_path`.
    pub fn denied(
        target_path: impl Into<String>,
        original_path: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            target_path: target_path.into(),
            original_path: Some(original_path.into()),
            message,
        }
    }

    /// A plain navigation that only carries a notice.
    pub fn notice(target_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            original_path: None,
            message: Some(message.into()),
        }
    }
}

/// Where to send the viewer after a successful sign-in.
///
/// The captured original path when there is one, `default` otherwise
/// (sign-in reached directly). Paths that are not app-relative (`//host`,
/// `https://...`) or that lead back to the sign-in page itself fall back to
/// `default` as well.
pub fn post_sign_in_destination(
    state: Option<&RedirectRequest>,
    default: &str,
) -> String {
    let Some(request) = state else {
        return default.to_string();
    };
    match request.original_path.as_deref() {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !is_same_page(path, &request.target_path) =>
        {
            path.to_string()
        }
        Some(path) => {
            tracing::warn!(path, "ignoring unsafe post-sign-in destination");
            default.to_string()
        }
        None => default.to_string(),
    }
}

fn is_same_page(path: &str, target: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.trim_end_matches('/') == target.trim_end_matches('/')
}
