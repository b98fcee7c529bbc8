//! Identity session management
//!
//! Provides:
//! - `Session` / `AuthState`: what consumers observe
//! - `IdentityProvider` / `ConsentFlow`: the provider seam
//! - `SessionManager` / `AuthContext`: the single listener and operations
//! - `ToolkitIdentityProvider`: hosted provider over REST
//! - `MemoryIdentityProvider`: local accounts with Argon2 hashes
//! - `PromptConsent`: terminal consent step for federated sign-in

pub mod manager;
pub mod memory;
pub mod password;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod toolkit;

pub use manager::{AuthContext, SessionManager, SessionSubscription};
pub use memory::MemoryIdentityProvider;
pub use prompt::PromptConsent;
pub use provider::{ConsentFlow, FederatedCredential, IdentityProvider};
pub use session::{AuthState, Session};
pub use toolkit::{ToolkitConfig, ToolkitIdentityProvider};
