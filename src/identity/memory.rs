//! In-memory identity provider
//!
//! Accounts live in a map keyed by lower-cased email with Argon2id hashes.
//! Behaves like the hosted provider from the manager's point of view: every
//! successful sign-in path and every sign-out is pushed through the session
//! channel. Used in dev mode and tests.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use super::password::{check_password_strength, hash_password, verify_password};
use super::provider::IdentityProvider;
use super::session::Session;
use crate::types::{DirectoryError, Result};

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
}

pub struct MemoryIdentityProvider {
    accounts: DashMap<String, Account>,
    session_tx: watch::Sender<Option<Session>>,
    /// Identity the consent flow yields; `None` behaves as a declined consent
    federated: RwLock<Option<Session>>,
    offline: AtomicBool,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (session_tx, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            session_tx,
            federated: RwLock::new(None),
            offline: AtomicBool::new(false),
        }
    }

    /// Start with a session restored from a previous run
    pub fn with_persisted_session(self, session: Session) -> Self {
        self.session_tx.send_replace(Some(session));
        self
    }

    pub fn with_federated_identity(self, session: Session) -> Self {
        Self {
            federated: RwLock::new(Some(session)),
            ..self
        }
    }

    /// Change what the next federated consent yields
    pub async fn set_federated_identity(&self, session: Option<Session>) {
        *self.federated.write().await = session;
    }

    /// Simulate the provider being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Push a session change as if it originated remotely
    pub fn emit(&self, session: Option<Session>) {
        self.session_tx.send_replace(session);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DirectoryError::Network("identity provider unreachable".into()));
        }
        Ok(())
    }

    fn session_for(account: &Account) -> Session {
        Session::new(account.uid.clone()).with_email(account.email.clone())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.ensure_online()?;

        let account = match self.accounts.get(&email.to_lowercase()) {
            Some(account) => account.clone(),
            None => {
                warn!("Sign-in failed - unknown account");
                return Err(DirectoryError::InvalidCredentials);
            }
        };

        if !verify_password(password, &account.password_hash)? {
            warn!(uid = %account.uid, "Sign-in failed - invalid password");
            return Err(DirectoryError::InvalidCredentials);
        }

        let session = Self::session_for(&account);
        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn create_account_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.ensure_online()?;
        check_password_strength(password)?;

        if email.trim().is_empty() || !email.contains('@') {
            return Err(DirectoryError::IdentityProvider("INVALID_EMAIL".into()));
        }

        let password_hash = hash_password(password)?;
        let account = match self.accounts.entry(email.to_lowercase()) {
            Entry::Occupied(_) => return Err(DirectoryError::AccountExists),
            Entry::Vacant(slot) => slot
                .insert(Account {
                    uid: Uuid::new_v4().simple().to_string(),
                    email: email.to_string(),
                    password_hash,
                })
                .clone(),
        };

        info!(uid = %account.uid, "Account created");

        let session = Self::session_for(&account);
        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in_interactive_federated(&self) -> Result<Session> {
        self.ensure_online()?;

        let session = self
            .federated
            .read()
            .await
            .clone()
            .ok_or(DirectoryError::UserCancelled)?;

        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.session_tx.send_replace(None);
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }
}
