//! Identity layer for SocialConnect.
//!
//! SocialConnect does not store credentials or issue tokens itself. That is
//! the job of a hosted identity provider. This crate defines the boundary
//! to that provider:
//!
//! - **Types** ([`Principal`], [`UserId`], [`SessionToken`], [`AuthChange`]):
//!   who is signed in, as the client sees it.
//! - **Provider seam** ([`IdentityProvider`], [`AccountProvider`],
//!   [`Subscription`]): the calls the client makes and the push channel it
//!   listens on.
//! - **In-memory provider** ([`MemoryProvider`]): a complete provider that
//!   lives in process, used by tests and the demo.
//!
//! # How it fits in the stack
//!
//! ```text
//! App shell (above)        ← drives sign-in/sign-out, renders views
//!     ↕
//! Session / Router         ← mirror provider state, gate protected routes
//!     ↕
//! Identity (this crate)    ← principal types and the provider boundary
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod provider;
mod types;

pub use error::IdentityError;
pub use memory::MemoryProvider;
pub use provider::{AccountProvider, IdentityProvider, SignUpRequest, Subscription};
pub use types::{AuthChange, AuthEvent, Principal, SessionToken, UserId};
