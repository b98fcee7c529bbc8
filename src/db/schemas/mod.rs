//! Database schemas
//!
//! Defines the MongoDB document structures for the resource directory.

mod resource;

pub use resource::{Category, Resource, ResourceDraft, Subcategory, RESOURCE_COLLECTION};
