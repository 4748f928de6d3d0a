//! The session store and its writer task.
//!
//! The store is split in two halves:
//!
//! - [`SessionStore`]: the handle the application owns. Reads are
//!   synchronous snapshots from a `watch` channel.
//! - `SessionWriter`: a Tokio task that owns the provider subscription,
//!   the in-flight session fetch, and the only `watch::Sender`. Nothing
//!   else can publish a state, which is what keeps the store single-writer.
//!
//! # Ordering
//!
//! The writer's `select!` is biased: teardown first, then provider
//! notifications, then the initial fetch, then commands. Two consequences:
//!
//! - After teardown is signalled, nothing else is applied.
//! - A notification the provider emitted before an auth action settled is
//!   applied before the settle, so the settled state already shows the
//!   new session.

use std::sync::Arc;

use socialconnect_identity::{
    AuthChange, IdentityError, IdentityProvider, Principal, Subscription,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{SessionError, SessionState};

/// Commands sent from handles to the writer task.
enum StoreCommand {
    /// An auth action started; show the session as loading.
    BeginPending,
    /// An auth action finished. `ack` fires once the writer has handled it.
    Settle { ack: Option<oneshot::Sender<()>> },
    /// Barrier: `ack` fires once everything queued before it is applied.
    Sync { ack: oneshot::Sender<()> },
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Process-wide owner of "who is signed in".
///
/// ## Lifecycle
///
/// ```text
/// initialize() ──→ [loading] ──(fetch or notification)──→ [settled]
///                                                            │
///                       notifications keep replacing ◄───────┘
///                                                            │
/// teardown() / drop ──→ writer stops, subscription released ◄┘
/// ```
pub struct SessionStore {
    state: watch::Receiver<SessionState>,
    commands: mpsc::UnboundedSender<StoreCommand>,
    shutdown: Option<oneshot::Sender<()>>,
    writer: Option<JoinHandle<()>>,
}

impl SessionStore {
    /// Subscribes to `provider` and starts fetching the current session.
    ///
    /// The subscription is opened before the fetch starts so no change is
    /// missed in between. A failed subscribe is logged and the store runs
    /// on the fetch result alone.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize<P: IdentityProvider>(provider: Arc<P>) -> Self {
        let subscription = match provider.subscribe() {
            Ok(subscription) => {
                tracing::debug!(
                    subscription = subscription.id(),
                    "subscribed to session changes"
                );
                Some(subscription)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "failed to subscribe to session changes"
                );
                None
            }
        };

        let (state_tx, state_rx) = watch::channel(SessionState::initial());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let writer = SessionWriter {
            state: state_tx,
            subscription,
            commands: command_rx,
            shutdown: shutdown_rx,
            fetched: false,
            answered: false,
            pending: 0,
        };
        let handle = tokio::spawn(writer.run(provider));

        tracing::info!("session store initializing");

        Self {
            state: state_rx,
            commands: command_tx,
            shutdown: Some(shutdown_tx),
            writer: Some(handle),
        }
    }

    /// The current state. Never blocks.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A read-only handle that can wait for changes.
    pub fn watch(&self) -> SessionWatch {
        SessionWatch {
            state: self.state.clone(),
        }
    }

    /// Marks the session as loading until the returned guard is settled
    /// or dropped.
    ///
    /// Used by the sign-in, sign-up, sign-out and password actions.
    pub fn begin_pending(&self) -> Result<PendingGuard, SessionError> {
        self.commands
            .send(StoreCommand::BeginPending)
            .map_err(|_| SessionError::Closed)?;
        Ok(PendingGuard {
            commands: self.commands.clone(),
            armed: true,
        })
    }

    /// Waits until every notification the provider queued before this call
    /// has been applied.
    pub async fn sync(&self) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(StoreCommand::Sync { ack: ack_tx })
            .map_err(|_| SessionError::Closed)?;
        ack_rx.await.map_err(|_| SessionError::Closed)
    }

    /// `true` until the store has been torn down.
    pub fn is_running(&self) -> bool {
        self.writer
            .as_ref()
            .is_some_and(|writer| !writer.is_finished())
    }

    /// Stops mirroring the provider.
    ///
    /// Waits for the writer to exit; the subscription and any fetch still
    /// in flight are dropped with it. The last published state stays
    /// readable through handles that outlive the store.
    pub async fn teardown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "session writer panicked");
                }
            }
        }
        tracing::info!("session store torn down");
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        // Not torn down explicitly: abort so the subscription is still
        // released and a late fetch can't land.
        if let Some(writer) = self.writer.take() {
            writer.abort();
            tracing::debug!("session store dropped, writer aborted");
        }
    }
}

// ---------------------------------------------------------------------------
// SessionWatch
// ---------------------------------------------------------------------------

/// Read-only view of the store for consumers that re-evaluate on change.
///
/// Cheap to clone. Keeps working (with the final state) after the store is
/// gone; only the waiting methods start failing.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    state: watch::Receiver<SessionState>,
}

impl SessionWatch {
    /// The current state.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Waits for the next published state and returns it.
    ///
    /// # Errors
    /// [`SessionError::Closed`] once the store has been torn down.
    pub async fn changed(&mut self) -> Result<SessionState, SessionError> {
        self.state
            .changed()
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(self.state.borrow_and_update().clone())
    }

    /// Waits until the state is no longer loading and returns it.
    /// Returns immediately if it already isn't.
    pub async fn settled(&mut self) -> Result<SessionState, SessionError> {
        let state = self
            .state
            .wait_for(|state| !state.loading)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok((*state).clone())
    }
}

// ---------------------------------------------------------------------------
// PendingGuard
// ---------------------------------------------------------------------------

/// Keeps the session in the loading state while an auth action runs.
///
/// Call [`settle`](Self::settle) when the action finishes to wait until
/// the store has caught up. Dropping the guard settles too, without
/// waiting, so an early return or a panic can't leave the UI stuck on the
/// loading placeholder.
#[must_use = "dropping the guard ends the pending state immediately"]
pub struct PendingGuard {
    commands: mpsc::UnboundedSender<StoreCommand>,
    armed: bool,
}

impl PendingGuard {
    /// Ends the pending state and waits for the writer to apply it.
    pub async fn settle(mut self) {
        self.armed = false;
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .commands
            .send(StoreCommand::Settle { ack: Some(ack_tx) })
            .is_ok()
        {
            let _ = ack_rx.await;
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.commands.send(StoreCommand::Settle { ack: None });
        }
    }
}

// ---------------------------------------------------------------------------
// SessionWriter
// ---------------------------------------------------------------------------

/// The task that owns every write to the session state.
struct SessionWriter {
    state: watch::Sender<SessionState>,
    subscription: Option<Subscription>,
    commands: mpsc::UnboundedReceiver<StoreCommand>,
    shutdown: oneshot::Receiver<()>,
    /// The initial fetch has completed (successfully or not).
    fetched: bool,
    /// The fetch or at least one notification has answered "who is
    /// signed in". Until then the state must stay loading.
    answered: bool,
    /// Auth actions currently in flight.
    pending: usize,
}

impl SessionWriter {
    async fn run<P: IdentityProvider>(mut self, provider: Arc<P>) {
        let fetch = provider.current_session();
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown => break,

                change = next_change(&mut self.subscription),
                    if self.subscription.is_some() =>
                {
                    match change {
                        Some(change) => self.apply_change(change),
                        None => {
                            tracing::warn!("provider closed the session channel");
                            self.subscription = None;
                        }
                    }
                }

                result = &mut fetch, if !self.fetched => self.apply_fetch(result),

                Some(command) = self.commands.recv() => self.handle_command(command),
            }
        }

        tracing::debug!("session writer stopped");
    }

    fn apply_change(&mut self, change: AuthChange) {
        tracing::debug!(
            event = %change.event,
            signed_in = change.principal.is_some(),
            "applying session change"
        );
        self.answered = true;
        self.state.send_replace(SessionState::settled(change.principal));
    }

    fn apply_fetch(&mut self, result: Result<Option<Principal>, IdentityError>) {
        self.fetched = true;
        self.answered = true;
        let principal = match result {
            Ok(principal) => principal,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "failed to fetch current session, treating as signed out"
                );
                None
            }
        };
        match &principal {
            Some(principal) => {
                tracing::info!(user_id = %principal.id, "session restored");
            }
            None => tracing::info!("no active session"),
        }
        self.state.send_replace(SessionState::settled(principal));
    }

    fn handle_command(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::BeginPending => {
                self.pending += 1;
                self.publish_loading(true);
            }
            StoreCommand::Settle { ack } => {
                self.pending = self.pending.saturating_sub(1);
                if self.pending == 0 && self.answered {
                    self.publish_loading(false);
                }
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            StoreCommand::Sync { ack } => {
                let _ = ack.send(());
            }
        }
    }

    /// Changes only the loading flag, keeping the current principal.
    /// Publishes nothing if the flag already has that value.
    fn publish_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            if state.loading == loading {
                false
            } else {
                state.loading = loading;
                true
            }
        });
    }
}

/// Next change from the subscription, or never if there is none.
async fn next_change(subscription: &mut Option<Subscription>) -> Option<AuthChange> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}
