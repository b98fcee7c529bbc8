//! Hosted identity provider over the Identity Toolkit REST API
//!
//! Endpoints used (all `POST {endpoint}/accounts:<method>?key=<api key>`):
//! - `signInWithPassword`, `signUp` for email/password
//! - `signInWithIdp` to exchange a federated ID token
//! - `lookup` to fill profile fields the sign-in responses omit
//!
//! The session and its ID token are held in memory only.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use super::provider::{ConsentFlow, IdentityProvider};
use super::session::Session;
use crate::types::{DirectoryError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

/// Connection settings for the hosted provider
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    pub api_key: String,
    /// Base URL up to and including the API version
    pub endpoint: String,
    /// Federated provider used by the consent flow, e.g. `google.com`
    pub federated_provider_id: String,
    /// Request URI reported to `signInWithIdp`
    pub request_uri: String,
}

impl ToolkitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            federated_provider_id: "google.com".to_string(),
            request_uri: "http://localhost".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: String,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a provider rejection message (e.g. `WEAK_PASSWORD : Password should
/// be at least 6 characters`) onto the error taxonomy
pub fn map_provider_error(message: &str) -> DirectoryError {
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_NOT_FOUND"
        | "INVALID_PASSWORD"
        | "INVALID_LOGIN_CREDENTIALS"
        | "INVALID_EMAIL"
        | "MISSING_EMAIL"
        | "MISSING_PASSWORD"
        | "USER_DISABLED" => DirectoryError::InvalidCredentials,
        "EMAIL_EXISTS" => DirectoryError::AccountExists,
        "WEAK_PASSWORD" => DirectoryError::WeakPassword(if detail.is_empty() {
            "Password rejected by provider".to_string()
        } else {
            detail.to_string()
        }),
        _ => DirectoryError::IdentityProvider(message.to_string()),
    }
}

/// Sign-up keeps only its own rejection kinds; anything else (a malformed
/// email, say) stays a provider error rather than a credentials failure
pub fn map_sign_up_error(message: &str) -> DirectoryError {
    match map_provider_error(message) {
        DirectoryError::InvalidCredentials => DirectoryError::IdentityProvider(message.to_string()),
        other => other,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub struct ToolkitIdentityProvider {
    config: ToolkitConfig,
    http: reqwest::Client,
    consent: Arc<dyn ConsentFlow>,
    session_tx: watch::Sender<Option<Session>>,
    id_token: RwLock<Option<String>>,
}

impl ToolkitIdentityProvider {
    pub fn new(config: ToolkitConfig, consent: Arc<dyn ConsentFlow>) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(DirectoryError::Config("identity API key is required".into()));
        }

        let (session_tx, _) = watch::channel(None);

        info!(endpoint = %config.endpoint, "Identity Toolkit provider created");

        Ok(Self {
            config,
            http: reqwest::Client::new(),
            consent,
            session_tx,
            id_token: RwLock::new(None),
        })
    }

    /// ID token of the current session, for calling authenticated backends
    pub async fn id_token(&self) -> Option<String> {
        self.id_token.read().await.clone()
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_mapped(method, body, map_provider_error).await
    }

    async fn call_mapped<B, R>(
        &self,
        method: &str,
        body: &B,
        map_rejection: fn(&str) -> DirectoryError,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/accounts:{}",
            self.config.endpoint.trim_end_matches('/'),
            method
        );

        debug!(method, "Identity Toolkit request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response.json::<R>().await.map_err(|e| {
                DirectoryError::IdentityProvider(format!("Malformed {} response: {}", method, e))
            });
        }

        if status.is_server_error() {
            warn!(method, %status, "Identity Toolkit server error");
            return Err(DirectoryError::Network(format!(
                "identity provider returned {}",
                status
            )));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);

        warn!(method, %status, message = %message, "Identity Toolkit rejected request");
        Err(map_rejection(&message))
    }

    /// Fetch the profile for a fresh sign-in and publish it as the session
    async fn establish(&self, auth: AuthResponse) -> Result<Session> {
        let lookup: LookupResponse = self
            .call(
                "lookup",
                &LookupRequest {
                    id_token: &auth.id_token,
                },
            )
            .await?;

        let user = lookup
            .users
            .into_iter()
            .find(|u| u.local_id == auth.local_id)
            .ok_or_else(|| {
                DirectoryError::IdentityProvider("lookup returned no matching user".into())
            })?;

        let session = Session {
            uid: user.local_id,
            email: non_empty(user.email),
            display_name: non_empty(user.display_name),
            photo_url: non_empty(user.photo_url),
        };

        *self.id_token.write().await = Some(auth.id_token);
        self.session_tx.send_replace(Some(session.clone()));

        info!(uid = %session.uid, "Identity session established");
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for ToolkitIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let auth: AuthResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.establish(auth).await
    }

    async fn create_account_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let auth: AuthResponse = self
            .call_mapped(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
                map_sign_up_error,
            )
            .await?;
        self.establish(auth).await
    }

    async fn sign_in_interactive_federated(&self) -> Result<Session> {
        let provider_id = &self.config.federated_provider_id;
        let credential = self
            .consent
            .obtain_credential(provider_id)
            .await?
            .ok_or(DirectoryError::UserCancelled)?;

        let post_body = serde_urlencoded::to_string([
            ("id_token", credential.id_token.as_str()),
            ("providerId", credential.provider_id.as_str()),
        ])
        .map_err(|e| DirectoryError::Internal(format!("Failed to encode credential: {}", e)))?;

        let auth: AuthResponse = self
            .call(
                "signInWithIdp",
                &IdpRequest {
                    post_body,
                    request_uri: self.config.request_uri.clone(),
                    return_idp_credential: true,
                    return_secure_token: true,
                },
            )
            .await?;
        self.establish(auth).await
    }

    async fn sign_out(&self) -> Result<()> {
        // Tokens are bearer credentials; dropping them ends the session
        *self.id_token.write().await = None;
        self.session_tx.send_replace(None);
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::provider::FederatedCredential;

    #[test]
    fn test_map_provider_error() {
        assert!(matches!(
            map_provider_error("INVALID_LOGIN_CREDENTIALS"),
            DirectoryError::InvalidCredentials
        ));
        assert!(matches!(
            map_provider_error("EMAIL_EXISTS"),
            DirectoryError::AccountExists
        ));
        match map_provider_error("WEAK_PASSWORD : Password should be at least 6 characters") {
            DirectoryError::WeakPassword(detail) => {
                assert_eq!(detail, "Password should be at least 6 characters")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            map_provider_error("TOO_MANY_ATTEMPTS_TRY_LATER"),
            DirectoryError::IdentityProvider(_)
        ));
    }

    #[test]
    fn test_map_sign_up_error() {
        assert!(matches!(
            map_sign_up_error("EMAIL_EXISTS"),
            DirectoryError::AccountExists
        ));
        assert!(matches!(
            map_sign_up_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            DirectoryError::WeakPassword(_)
        ));
        match map_sign_up_error("INVALID_EMAIL") {
            DirectoryError::IdentityProvider(message) => assert_eq!(message, "INVALID_EMAIL"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_request_field_names() {
        let body = serde_json::to_value(PasswordRequest {
            email: "a@example.com",
            password: "secret",
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(body["returnSecureToken"], true);

        let idp = serde_json::to_value(IdpRequest {
            post_body: "id_token=x&providerId=google.com".into(),
            request_uri: "http://localhost".into(),
            return_idp_credential: true,
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(idp["postBody"], "id_token=x&providerId=google.com");
        assert_eq!(idp["requestUri"], "http://localhost");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        struct Never;
        #[async_trait]
        impl ConsentFlow for Never {
            async fn obtain_credential(
                &self,
                _provider_id: &str,
            ) -> Result<Option<FederatedCredential>> {
                Ok(None)
            }
        }

        let result = ToolkitIdentityProvider::new(ToolkitConfig::new(""), Arc::new(Never));
        assert!(matches!(result, Err(DirectoryError::Config(_))));
    }
}
