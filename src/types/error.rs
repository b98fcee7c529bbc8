//! Error types for the directory core
//!
//! Auth-side and data-side failures share one enum so callers can match on a
//! distinguishable kind regardless of which component produced it.

/// Main error type for directory operations
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    // Identity provider
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    AccountExists,

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Sign-in cancelled by user")]
    UserCancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Auth context used before a session manager was attached")]
    AuthNotInitialized,

    // Document store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    // Misc
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DirectoryError {
    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountExists => "ACCOUNT_EXISTS",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::UserCancelled => "USER_CANCELLED",
            Self::Network(_) => "NETWORK_ERROR",
            Self::IdentityProvider(_) => "IDENTITY_PROVIDER_ERROR",
            Self::AuthNotInitialized => "AUTH_NOT_INITIALIZED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::InvalidResource(_) => "INVALID_RESOURCE",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures raised by the identity provider side
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::AccountExists
                | Self::WeakPassword(_)
                | Self::UserCancelled
                | Self::Network(_)
                | Self::IdentityProvider(_)
                | Self::AuthNotInitialized
        )
    }
}

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResource(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for DirectoryError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            mongodb::error::ErrorKind::BsonDeserialization(_) => {
                Self::InvalidResource(err.to_string())
            }
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<bson::oid::Error> for DirectoryError {
    fn from(err: bson::oid::Error) -> Self {
        Self::InvalidIdentifier(err.to_string())
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;
