//! Identity session manager
//!
//! Wraps an [`IdentityProvider`] and republishes its session pushes as an
//! [`AuthState`] watch channel. Attaching a manager registers the one and only
//! provider listener for that manager; it runs until the manager is disposed
//! or dropped.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::provider::IdentityProvider;
use super::session::{AuthState, Session};
use crate::types::{DirectoryError, Result};

/// Terminal handle to the provider listener task
#[derive(Debug)]
pub struct SessionSubscription {
    task: JoinHandle<()>,
}

impl SessionSubscription {
    /// Stop receiving provider pushes
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state_tx: Arc<watch::Sender<AuthState>>,
    subscription: Mutex<Option<SessionSubscription>>,
}

impl SessionManager {
    /// Attach to a provider and start listening.
    ///
    /// Must be called from within a tokio runtime. The state stays
    /// `Unresolved` until the listener delivers the provider's first
    /// observation (the persisted session, or its absence).
    pub fn attach(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Unresolved);
        let state_tx = Arc::new(state_tx);

        let mut changes = provider.session_changes();
        let forward_tx = Arc::clone(&state_tx);
        let task = tokio::spawn(async move {
            loop {
                let session = changes.borrow_and_update().clone();
                debug!(signed_in = session.is_some(), "Session observation");
                forward_tx.send_replace(AuthState::from(session));

                if changes.changed().await.is_err() {
                    debug!("Identity provider dropped its session channel");
                    break;
                }
            }
        });

        info!("Session manager attached");

        Self {
            provider,
            state_tx,
            subscription: Mutex::new(Some(SessionSubscription { task })),
        }
    }

    /// Latest observed state
    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state_tx.borrow().session().cloned()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Wait for the first provider observation.
    ///
    /// A disposed manager never observes again, so its current state is
    /// returned as is.
    pub async fn resolved(&self) -> AuthState {
        if !self.is_listening() {
            return self.state();
        }
        let mut rx = self.watch();
        let resolved = rx
            .wait_for(|state| state.is_resolved())
            .await
            .map(|state| state.clone());
        // The sender lives in self, so the channel cannot close under us
        resolved.unwrap_or_else(|_| self.state())
    }

    /// Email/password sign-in; the listener publishes the new session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let result = self.provider.sign_in_with_password(email, password).await;
        log_outcome("sign_in", &result);
        result
    }

    /// Create an account; the provider signs the new account in
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let result = self
            .provider
            .create_account_with_password(email, password)
            .await;
        log_outcome("sign_up", &result);
        result
    }

    pub async fn sign_in_with_federated_provider(&self) -> Result<Session> {
        let result = self.provider.sign_in_interactive_federated().await;
        log_outcome("sign_in_federated", &result);
        result
    }

    /// Clear the provider session. Safe to repeat.
    ///
    /// Returns once the listener has caught up with the provider's latest
    /// push. The state is never written here: if the provider reports another
    /// session after the sign-out, that session stands.
    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.caught_up().await;
        info!("Signed out");
        Ok(())
    }

    /// Wait until the state mirrors the provider's latest push
    async fn caught_up(&self) {
        if !self.is_listening() {
            return;
        }
        let latest = self.provider.session_changes();
        let mut rx = self.watch();
        let _ = rx
            .wait_for(|state| *state == AuthState::from(latest.borrow().clone()))
            .await;
    }

    /// Whether the provider listener is still running
    pub fn is_listening(&self) -> bool {
        self.subscription
            .lock()
            .map(|s| s.as_ref().is_some_and(SessionSubscription::is_active))
            .unwrap_or(false)
    }

    /// Tear down the provider listener; later calls do nothing
    pub fn dispose(&self) {
        let subscription = match self.subscription.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            info!("Session manager disposed");
        }
    }
}

fn log_outcome(operation: &str, result: &Result<Session>) {
    match result {
        Ok(session) => info!(operation, uid = %session.uid, "Identity operation succeeded"),
        Err(e) => warn!(operation, code = e.code(), "Identity operation failed: {}", e),
    }
}

/// Auth handle as seen by consumers before and after a manager exists.
///
/// `Uninitialized` stands in for "no provider wired up yet": it reads as
/// `Unresolved` and refuses every operation instead of silently doing nothing.
#[derive(Clone, Default)]
pub enum AuthContext {
    #[default]
    Uninitialized,
    Attached(Arc<SessionManager>),
}

impl AuthContext {
    pub fn attach(provider: Arc<dyn IdentityProvider>) -> Self {
        AuthContext::Attached(Arc::new(SessionManager::attach(provider)))
    }

    pub fn manager(&self) -> Result<&Arc<SessionManager>> {
        match self {
            AuthContext::Attached(manager) => Ok(manager),
            AuthContext::Uninitialized => Err(DirectoryError::AuthNotInitialized),
        }
    }

    pub fn state(&self) -> AuthState {
        match self {
            AuthContext::Attached(manager) => manager.state(),
            AuthContext::Uninitialized => AuthState::Unresolved,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.manager()?.sign_in(email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        self.manager()?.sign_up(email, password).await
    }

    pub async fn sign_in_with_federated_provider(&self) -> Result<Session> {
        self.manager()?.sign_in_with_federated_provider().await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.manager()?.sign_out().await
    }
}
