//! Vet1Stop - resource directory data access and identity sessions
//!
//! ## Components
//!
//! - **Resources**: filtered, ranked, capped reads over the MongoDB `resources`
//!   collection, with featured/search/category/related conveniences
//! - **Identity**: a session manager that holds one provider listener and
//!   exposes sign-in, sign-up, federated sign-in and sign-out
//! - **CLI**: `vet1stop` binary driving both against configured backends

pub mod config;
pub mod db;
pub mod identity;
pub mod resources;
pub mod types;

pub use config::Args;
pub use identity::{AuthContext, AuthState, IdentityProvider, Session, SessionManager};
pub use resources::{ResourceFilter, ResourceRepository, ResourceStore};
pub use types::{DirectoryError, Result};
