//! Client-side session store for SocialConnect.
//!
//! This crate answers one question for the rest of the client: *who is
//! signed in right now?* It does so by mirroring an external
//! [`IdentityProvider`](socialconnect_identity::IdentityProvider):
//!
//! 1. **Initialize**: subscribe to the provider's change channel, then
//!    fetch the current session once ([`SessionStore::initialize`]).
//! 2. **Mirror**: apply every pushed change, in arrival order.
//! 3. **Tear down**: unsubscribe and drop any fetch still in flight
//!    ([`SessionStore::teardown`]).
//!
//! Readers get immutable [`SessionState`] snapshots. Only the store's own
//! writer task ever changes the state.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router / App (above)  ← read snapshots, re-render on change
//!     ↕
//! Session Store (this crate)  ← single writer, last-write-wins
//!     ↕
//! Identity provider (below)  ← one-shot fetch + push notifications
//! ```

mod error;
mod state;
mod store;

pub use error::SessionError;
pub use state::{SessionState, SessionStatus};
pub use store::{PendingGuard, SessionStore, SessionWatch};
