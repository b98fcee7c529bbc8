//! Shared types

pub mod error;

pub use error::{DirectoryError, Result};
