//! Integration tests for the session store.
//!
//! Every test runs on paused Tokio time, so provider latency is virtual:
//! `sleep` and the provider's simulated round trip resolve as soon as the
//! runtime is otherwise idle, in deadline order.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use socialconnect_identity::{
    AuthChange, AuthEvent, IdentityError, IdentityProvider, MemoryProvider, Principal,
    SessionToken, Subscription,
};
use tokio::sync::mpsc;
use socialconnect_session::{SessionError, SessionState, SessionStatus, SessionStore};

// =========================================================================
// Helpers
// =========================================================================

const LATENCY: Duration = Duration::from_millis(50);

/// A provider with one account ("ada", id "u1") and nobody signed in.
fn provider() -> Arc<MemoryProvider> {
    Arc::new(
        MemoryProvider::new()
            .with_latency(LATENCY)
            .with_account("u1", "ada@example.com", "ada", "correct-horse"),
    )
}

fn principal(id: &str) -> Principal {
    Principal::new(id, format!("{id}@example.com"), SessionToken::new(id))
}

fn signed_in(id: &str) -> AuthChange {
    AuthChange {
        event: AuthEvent::SignedIn,
        principal: Some(principal(id)),
    }
}

/// A provider whose `current_session` answers with the session as it was
/// when the call was made, after `LATENCY`. Pushing a change in the
/// meantime leaves that answer stale, which is how a slow fetch can land
/// after a newer notification.
struct SnapshotProvider {
    current: Mutex<Option<Principal>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<AuthChange>>>,
}

impl SnapshotProvider {
    fn new(current: Option<Principal>) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(current),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, change: AuthChange) {
        *self.current.lock().unwrap() = change.principal.clone();
        for tx in self.subscribers.lock().unwrap().iter() {
            let _ = tx.send(change.clone());
        }
    }
}

impl IdentityProvider for SnapshotProvider {
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Principal>, IdentityError>> + Send {
        let snapshot = self.current.lock().unwrap().clone();
        async move {
            tokio::time::sleep(LATENCY).await;
            Ok(snapshot)
        }
    }

    fn subscribe(&self) -> Result<Subscription, IdentityError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.push(tx);
        Ok(Subscription::new(subscribers.len() as u64, rx))
    }
}

// =========================================================================
// initialize()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_initialize_starts_loading() {
    let store = SessionStore::initialize(provider());

    let state = store.snapshot();

    assert_eq!(state, SessionState::initial());
    assert_eq!(state.status(), SessionStatus::Unknown);
    assert!(store.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_initialize_without_session_settles_anonymous() {
    let store = SessionStore::initialize(provider());

    let state = store.watch().settled().await.expect("store is running");

    assert_eq!(state.status(), SessionStatus::Anonymous);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_with_restored_session_settles_authenticated() {
    let provider = provider();
    let restored = provider.restore_session("ada").unwrap();
    let store = SessionStore::initialize(Arc::clone(&provider));

    let state = store.watch().settled().await.unwrap();

    assert_eq!(state.principal, Some(restored));
    assert!(state.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_initialize_settles_only_after_provider_answers() {
    let store = SessionStore::initialize(provider());

    tokio::time::sleep(LATENCY / 2).await;
    assert!(store.snapshot().loading, "fetch has not resolved yet");

    tokio::time::sleep(LATENCY).await;
    assert!(!store.snapshot().loading);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_provider_down_settles_anonymous() {
    // Both subscribe and fetch fail. The store must still clear loading
    // instead of leaving the viewer on the placeholder.
    let provider = provider();
    provider.restore_session("ada").unwrap();
    provider.set_unavailable(true);

    let store = SessionStore::initialize(provider);
    let state = store.watch().settled().await.unwrap();

    assert_eq!(state, SessionState::settled(None));
}

#[tokio::test(start_paused = true)]
async fn test_initialize_fetch_failure_after_subscribe_settles_anonymous() {
    let provider = provider();
    provider.restore_session("ada").unwrap();
    let store = SessionStore::initialize(Arc::clone(&provider));
    // Subscribed fine; the provider goes down before the fetch resolves.
    provider.set_unavailable(true);

    let state = store.watch().settled().await.unwrap();

    assert_eq!(state.status(), SessionStatus::Anonymous);
}

// =========================================================================
// Notifications
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_notification_before_fetch_settles_immediately() {
    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));

    provider.emit(signed_in("u1"));
    store.sync().await.unwrap();

    // The fetch is still in flight, but the push already answered.
    let state = store.snapshot();
    assert_eq!(state, SessionState::settled(Some(principal("u1"))));
}

#[tokio::test(start_paused = true)]
async fn test_notifications_last_write_wins_in_arrival_order() {
    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));
    store.watch().settled().await.unwrap();

    provider.emit(signed_in("u1"));
    provider.emit(AuthChange::signed_out());
    provider.emit(signed_in("u2"));
    provider.emit(signed_in("u3"));
    store.sync().await.unwrap();

    assert_eq!(store.snapshot().principal, Some(principal("u3")));
}

#[tokio::test(start_paused = true)]
async fn test_notification_sign_out_clears_principal() {
    let provider = provider();
    provider.restore_session("ada").unwrap();
    let store = SessionStore::initialize(Arc::clone(&provider));
    store.watch().settled().await.unwrap();

    provider.force_sign_out();
    store.sync().await.unwrap();

    assert_eq!(store.snapshot(), SessionState::settled(None));
}

#[tokio::test(start_paused = true)]
async fn test_notification_token_refresh_replaces_principal() {
    let provider = provider();
    provider.restore_session("ada").unwrap();
    let store = SessionStore::initialize(Arc::clone(&provider));
    let before = store.watch().settled().await.unwrap();

    let refreshed = provider.refresh_token().expect("signed in");
    store.sync().await.unwrap();

    let after = store.snapshot();
    assert_eq!(after.principal, Some(refreshed));
    assert_ne!(after.principal, before.principal);
}

#[tokio::test(start_paused = true)]
async fn test_watch_changed_reports_new_state() {
    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));
    let mut watch = store.watch();
    watch.settled().await.unwrap();

    provider.emit(signed_in("u1"));
    let state = watch.changed().await.unwrap();

    assert_eq!(state.principal, Some(principal("u1")));
}

// =========================================================================
// Fetch and notification ordering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fetch_resolving_after_notification_wins() {
    let provider = SnapshotProvider::new(Some(principal("u1")));
    let store = SessionStore::initialize(Arc::clone(&provider));
    // The writer has issued the fetch, which captured "u1".
    store.sync().await.unwrap();

    provider.push(signed_in("u2"));
    store.sync().await.unwrap();
    assert_eq!(store.snapshot(), SessionState::settled(Some(principal("u2"))));

    tokio::time::sleep(LATENCY * 2).await;
    store.sync().await.unwrap();

    // Last write wins, even when the last write is the older answer.
    assert_eq!(store.snapshot(), SessionState::settled(Some(principal("u1"))));
}

#[tokio::test(start_paused = true)]
async fn test_notification_after_fetch_wins() {
    let provider = SnapshotProvider::new(Some(principal("u1")));
    let store = SessionStore::initialize(Arc::clone(&provider));
    let fetched = store.watch().settled().await.unwrap();
    assert_eq!(fetched.principal, Some(principal("u1")));

    provider.push(AuthChange::signed_out());
    store.sync().await.unwrap();

    assert_eq!(store.snapshot(), SessionState::settled(None));
}

// =========================================================================
// Pending auth actions
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_begin_pending_marks_loading_and_keeps_principal() {
    let provider = provider();
    provider.restore_session("ada").unwrap();
    let store = SessionStore::initialize(Arc::clone(&provider));
    let settled = store.watch().settled().await.unwrap();

    let guard = store.begin_pending().unwrap();
    store.sync().await.unwrap();
    let pending = store.snapshot();
    assert!(pending.loading);
    assert_eq!(pending.status(), SessionStatus::Unknown);
    assert_eq!(pending.principal, settled.principal);

    guard.settle().await;
    assert_eq!(store.snapshot(), settled);
}

#[tokio::test(start_paused = true)]
async fn test_pending_guard_drop_settles() {
    let store = SessionStore::initialize(provider());
    store.watch().settled().await.unwrap();

    let guard = store.begin_pending().unwrap();
    drop(guard);
    store.sync().await.unwrap();

    assert!(!store.snapshot().loading);
}

#[tokio::test(start_paused = true)]
async fn test_pending_settled_before_fetch_keeps_loading() {
    // Settling an action must not end the initial loading phase early.
    let store = SessionStore::initialize(provider());

    store.begin_pending().unwrap().settle().await;

    assert!(store.snapshot().loading);
    assert!(!store.watch().settled().await.unwrap().loading);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_pending_actions_settle_together() {
    let store = SessionStore::initialize(provider());
    store.watch().settled().await.unwrap();

    let first = store.begin_pending().unwrap();
    let second = store.begin_pending().unwrap();
    first.settle().await;
    assert!(store.snapshot().loading, "second action still running");

    second.settle().await;
    assert!(!store.snapshot().loading);
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_notification_applied_before_settle() {
    use socialconnect_identity::AccountProvider;

    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));
    store.watch().settled().await.unwrap();

    let guard = store.begin_pending().unwrap();
    let principal = provider
        .sign_in_with_password("ada", "correct-horse")
        .await
        .unwrap();
    guard.settle().await;

    assert_eq!(store.snapshot(), SessionState::settled(Some(principal)));
}

// =========================================================================
// teardown()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_teardown_releases_subscription() {
    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));
    assert_eq!(provider.subscriber_count(), 1);

    store.teardown().await;

    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_ignores_late_notification() {
    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));
    let watch = store.watch();
    let before = store.watch().settled().await.unwrap();

    store.teardown().await;
    provider.emit(signed_in("u1"));
    tokio::time::sleep(LATENCY).await;

    assert_eq!(watch.current(), before);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_discards_late_fetch() {
    let provider = provider();
    provider.restore_session("ada").unwrap();
    let store = SessionStore::initialize(Arc::clone(&provider));
    let mut watch = store.watch();

    // Tear down while the 50ms fetch is still in flight.
    store.teardown().await;
    tokio::time::sleep(LATENCY * 2).await;

    assert_eq!(watch.current(), SessionState::initial());
    assert_eq!(watch.changed().await, Err(SessionError::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_drop_without_teardown_releases_subscription() {
    let provider = provider();
    let store = SessionStore::initialize(Arc::clone(&provider));
    assert_eq!(provider.subscriber_count(), 1);

    drop(store);
    // Give the runtime a turn to cancel the aborted writer.
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(provider.subscriber_count(), 0);
}
