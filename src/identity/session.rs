//! Session value and observable auth state

use serde::{Deserialize, Serialize};

/// Authenticated identity for this application instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Provider-assigned user ID
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}

/// What consumers observe about the current session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "session", rename_all = "snake_case")]
pub enum AuthState {
    /// No observation from the provider yet
    #[default]
    Unresolved,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unresolved)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

impl From<Option<Session>> for AuthState {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => AuthState::Authenticated(session),
            None => AuthState::Unauthenticated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_is_not_unauthenticated() {
        let state = AuthState::default();
        assert!(!state.is_resolved());
        assert_ne!(state, AuthState::Unauthenticated);
        assert!(state.session().is_none());
    }

    #[test]
    fn test_from_observation() {
        let session = Session::new("u1").with_email("a@example.com");
        assert_eq!(
            AuthState::from(Some(session.clone())).session(),
            Some(&session)
        );
        assert_eq!(AuthState::from(None), AuthState::Unauthenticated);
    }
}
