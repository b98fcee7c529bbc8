//! Identity provider seam
//!
//! The session manager only talks to these traits. Providers keep the current
//! session themselves and push every change through a watch channel.

use async_trait::async_trait;
use tokio::sync::watch;

use super::session::Session;
use crate::types::Result;

/// Third-party identity provider client
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Rejections surface as `InvalidCredentials` or `Network`
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Rejections surface as `AccountExists`, `WeakPassword` or `Network`.
    /// Anything else the provider refuses (a malformed email) is
    /// `IdentityProvider`.
    async fn create_account_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Runs the interactive consent flow; `UserCancelled` when declined
    async fn sign_in_interactive_federated(&self) -> Result<Session>;

    /// Clear the provider-held session; signing out twice is not an error
    async fn sign_out(&self) -> Result<()>;

    /// Receiver whose current value is the persisted session, if any
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;
}

/// Credential returned by a federated consent flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    /// OpenID Connect ID token issued by the federated provider
    pub id_token: String,
    /// Provider identifier, e.g. `google.com`
    pub provider_id: String,
}

/// Interactive consent step for federated sign-in
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    /// `Ok(None)` means the user declined
    async fn obtain_credential(&self, provider_id: &str) -> Result<Option<FederatedCredential>>;
}
