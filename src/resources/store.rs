//! Resource store abstraction and its MongoDB implementation

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::debug;

use super::query::ResourceQuery;
use crate::db::schemas::{Resource, RESOURCE_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::Result;

/// Document store holding resource records.
///
/// Implementations own connection-level concurrency; callers treat them as
/// already thread-safe.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Run a query, honoring its order and limit
    async fn find(&self, query: &ResourceQuery) -> Result<Vec<Resource>>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Resource>>;

    /// Insert records, returning how many were written
    async fn insert_many(&self, resources: Vec<Resource>) -> Result<usize>;
}

/// Store backed by the `resources` collection
#[derive(Clone)]
pub struct MongoResourceStore {
    collection: MongoCollection<Resource>,
}

impl MongoResourceStore {
    pub fn new(collection: MongoCollection<Resource>) -> Self {
        Self { collection }
    }

    /// Open the named collection (defaults to `resources`)
    pub async fn open(client: &MongoClient, collection_name: Option<&str>) -> Result<Self> {
        let name = collection_name.unwrap_or(RESOURCE_COLLECTION);
        let collection = client.collection::<Resource>(name).await?;
        Ok(Self::new(collection))
    }
}

#[async_trait]
impl ResourceStore for MongoResourceStore {
    async fn find(&self, query: &ResourceQuery) -> Result<Vec<Resource>> {
        let filter = query.to_filter();
        debug!(filter = %filter, "Querying resources");
        self.collection.find_many(filter, query.find_options()).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Resource>> {
        self.collection.find_one(doc! { "_id": *id }).await
    }

    async fn insert_many(&self, resources: Vec<Resource>) -> Result<usize> {
        self.collection.insert_many(resources).await
    }
}
