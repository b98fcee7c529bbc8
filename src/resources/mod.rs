//! Resource directory reads
//!
//! - `filter`: caller-facing optional criteria
//! - `query`: typed predicate list rendered for MongoDB or evaluated in memory
//! - `store`: store trait and MongoDB implementation
//! - `memory`: in-memory store for dev mode and tests
//! - `repository`: listing operations and conveniences

pub mod filter;
pub mod memory;
pub mod query;
pub mod repository;
pub mod store;

pub use filter::ResourceFilter;
pub use memory::InMemoryResourceStore;
pub use query::{Predicate, ResourceQuery, TextPattern, RESULT_LIMIT};
pub use repository::{parse_id, ResourceRepository, RELATED_LIMIT, RELATED_TAG_LIMIT};
pub use store::{MongoResourceStore, ResourceStore};
