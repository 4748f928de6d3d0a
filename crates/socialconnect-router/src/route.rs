//! Route table: which paths exist and who may see them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::RouteError;

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Who may view a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    /// Anyone, signed in or not (sign-in, register, password pages).
    Public,
    /// Signed-in users only; goes through the route guard.
    Protected,
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// One entry in the route table.
///
/// Patterns are absolute paths made of static segments and `:name`
/// parameters, e.g. `/profile/:userId`. `/` is the root.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    pattern: String,
    access: Access,
    segments: Vec<Segment>,
}

impl Route {
    /// Parses `pattern` and builds a route.
    ///
    /// # Errors
    /// [`RouteError::InvalidPattern`] if the pattern is not absolute or has
    /// an empty segment or an unnamed parameter.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        access: Access,
    ) -> Result<Self, RouteError> {
        let parts = split_path(pattern)
            .ok_or_else(|| RouteError::InvalidPattern(pattern.to_string()))?;

        let mut segments = Vec::with_capacity(parts.len());
        for part in parts {
            match part.strip_prefix(':') {
                Some("") => {
                    return Err(RouteError::InvalidPattern(pattern.to_string()));
                }
                Some(param) => segments.push(Segment::Param(param.to_string())),
                None => segments.push(Segment::Static(part.to_string())),
            }
        }

        Ok(Self {
            name: name.into(),
            pattern: pattern.to_string(),
            access,
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Matches already-split path segments, returning the captured
    /// parameters on success.
    fn capture(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(expected) if expected == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }
}

/// The result of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Name of the matched route.
    pub name: String,
    /// Access level of the matched route.
    pub access: Access,
    /// The path as requested, query string included.
    pub path: String,
    /// Captured `:param` values, keyed by parameter name.
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    /// Looks up a captured parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn is_protected(&self) -> bool {
        self.access == Access::Protected
    }
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

/// Ordered list of routes. The first route that matches a path wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The SocialConnect client's routes.
    ///
    /// The auth pages are public; the root and every page of the app
    /// proper are protected. There is no public fallback for `/`: an
    /// anonymous viewer there goes through the guard like anywhere else.
    pub fn social() -> Self {
        const ROUTES: &[(&str, &str, Access)] = &[
            ("login", "/login", Access::Public),
            ("register", "/register", Access::Public),
            ("reset-password", "/reset-password", Access::Public),
            ("update-password", "/update-password", Access::Public),
            ("home", "/", Access::Protected),
            ("explore", "/explore", Access::Protected),
            ("profile", "/profile/:userId", Access::Protected),
            ("connections", "/connections", Access::Protected),
            ("messages", "/messages", Access::Protected),
            ("notifications", "/notifications", Access::Protected),
        ];

        let mut table = Self::new();
        for &(name, pattern, access) in ROUTES {
            match Route::new(name, pattern, access) {
                Ok(route) => table.routes.push(route),
                Err(e) => tracing::error!(error = %e, "skipping built-in route"),
            }
        }
        table
    }

    /// Appends a public route.
    pub fn public(self, name: &str, pattern: &str) -> Result<Self, RouteError> {
        self.with(Route::new(name, pattern, Access::Public)?)
    }

    /// Appends a protected route.
    pub fn protected(self, name: &str, pattern: &str) -> Result<Self, RouteError> {
        self.with(Route::new(name, pattern, Access::Protected)?)
    }

    /// Appends a route.
    ///
    /// # Errors
    /// [`RouteError::DuplicateRoute`] if the name is already taken.
    pub fn with(mut self, route: Route) -> Result<Self, RouteError> {
        if self.get(route.name()).is_some() {
            return Err(RouteError::DuplicateRoute(route.name));
        }
        self.routes.push(route);
        Ok(self)
    }

    /// Finds the first route matching `path`.
    ///
    /// The query string and fragment are ignored, as is a single trailing
    /// slash. Returns `None` for unknown or malformed paths.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let parts = split_path(strip_query(path))?;
        self.routes.iter().find_map(|route| {
            route.capture(&parts).map(|params| RouteMatch {
                name: route.name.clone(),
                access: route.access,
                path: path.to_string(),
                params,
            })
        })
    }

    /// Looks up a route by name.
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Cuts off `?query` and `#fragment`.
fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Splits an absolute path into segments. `/` is zero segments; one
/// trailing slash is allowed. `None` if the path is relative or has an
/// empty segment.
fn split_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let parts: Vec<&str> = rest.split('/').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Route::new()
    // =====================================================================

    #[test]
    fn test_route_new_relative_pattern_is_invalid() {
        let result = Route::new("bad", "messages", Access::Public);
        assert!(matches!(result, Err(RouteError::InvalidPattern(_))));
    }

    #[test]
    fn test_route_new_unnamed_param_is_invalid() {
        let result = Route::new("bad", "/profile/:", Access::Protected);
        assert!(matches!(result, Err(RouteError::InvalidPattern(_))));
    }

    #[test]
    fn test_route_new_empty_segment_is_invalid() {
        let result = Route::new("bad", "/a//b", Access::Protected);
        assert!(matches!(result, Err(RouteError::InvalidPattern(_))));
    }

    // =====================================================================
    // RouteTable::resolve()
    // =====================================================================

    #[test]
    fn test_resolve_root_is_protected_home() {
        let table = RouteTable::social();

        let m = table.resolve("/").expect("root is routed");

        assert_eq!(m.name, "home");
        assert!(m.is_protected());
    }

    #[test]
    fn test_resolve_login_is_public() {
        let m = RouteTable::social().resolve("/login").unwrap();
        assert_eq!(m.access, Access::Public);
    }

    #[test]
    fn test_resolve_captures_param() {
        let m = RouteTable::social().resolve("/profile/u42").unwrap();

        assert_eq!(m.name, "profile");
        assert_eq!(m.param("userId"), Some("u42"));
    }

    #[test]
    fn test_resolve_ignores_query_fragment_and_trailing_slash() {
        let table = RouteTable::social();

        let m = table.resolve("/messages/?thread=7#latest").unwrap();

        assert_eq!(m.name, "messages");
        // The original request is kept for redirects.
        assert_eq!(m.path, "/messages/?thread=7#latest");
    }

    #[test]
    fn test_resolve_unknown_path_is_none() {
        let table = RouteTable::social();
        assert!(table.resolve("/settings").is_none());
        assert!(table.resolve("/profile").is_none());
        assert!(table.resolve("/profile/u1/extra").is_none());
        assert!(table.resolve("messages").is_none());
        assert!(table.resolve("//messages").is_none());
    }

    #[test]
    fn test_resolve_first_declared_route_wins() {
        let table = RouteTable::new()
            .protected("specific", "/profile/me")
            .unwrap()
            .protected("profile", "/profile/:userId")
            .unwrap();

        assert_eq!(table.resolve("/profile/me").unwrap().name, "specific");
        assert_eq!(table.resolve("/profile/u1").unwrap().name, "profile");
    }

    #[test]
    fn test_with_duplicate_name_is_rejected() {
        let result = RouteTable::new()
            .public("login", "/login")
            .unwrap()
            .public("login", "/signin");

        assert_eq!(result.unwrap_err(), RouteError::DuplicateRoute("login".into()));
    }

    #[test]
    fn test_social_table_has_all_pages() {
        let table = RouteTable::social();

        assert_eq!(table.len(), 10);
        let public: Vec<&str> = table
            .routes()
            .filter(|r| r.access() == Access::Public)
            .map(Route::name)
            .collect();
        assert_eq!(
            public,
            vec!["login", "register", "reset-password", "update-password"]
        );
        assert_eq!(table.get("profile").unwrap().pattern(), "/profile/:userId");
    }
}
