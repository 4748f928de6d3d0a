//! Routing and access control for SocialConnect.
//!
//! Each navigation goes through three steps:
//!
//! 1. **Resolve** the path against the [`RouteTable`] to find the page and
//!    whether it is public or protected.
//! 2. **Guard** protected pages with the [`RouteGuard`], which looks at the
//!    latest session snapshot and answers [`GuardDecision::Pending`],
//!    [`GuardDecision::Granted`] or [`GuardDecision::Denied`].
//! 3. **Commit** the result to the [`History`]. A denial replaces the
//!    current entry with the sign-in page and attaches a
//!    [`RedirectRequest`] so sign-in can send the viewer back afterwards.
//!
//! Nothing here caches a decision: every render evaluates the guard again
//! with the snapshot of that moment.

mod error;
mod guard;
mod history;
mod redirect;
mod route;

pub use error::RouteError;
pub use guard::{GuardDecision, RouteGuard};
pub use history::{History, HistoryEntry};
pub use redirect::{RedirectRequest, post_sign_in_destination};
pub use route::{Access, Route, RouteMatch, RouteTable};
