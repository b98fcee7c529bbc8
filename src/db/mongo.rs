//! MongoDB client and collection wrapper

use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::{
    error::ErrorKind,
    options::{FindOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::types::DirectoryError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Hide `user:password@` credentials in a connection string
fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => uri.to_string(),
    }
}

/// Reads fail as bad data when a stored document does not decode
fn read_error(operation: &str, err: mongodb::error::Error) -> DirectoryError {
    match err.kind.as_ref() {
        ErrorKind::BsonDeserialization(_) => DirectoryError::InvalidResource(format!(
            "{} returned an undecodable document: {}",
            operation, err
        )),
        _ => DirectoryError::StoreUnavailable(format!("{} failed: {}", operation, err)),
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, DirectoryError> {
        info!("Connecting to MongoDB at {}", redact_uri(uri));

        // Bound server selection so an unreachable store fails fast
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await.map_err(|e| {
            DirectoryError::StoreUnavailable(format!("Failed to connect to MongoDB: {}", e))
        })?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DirectoryError::StoreUnavailable(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, applying its schema indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, DirectoryError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Create a new collection handle and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, DirectoryError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), DirectoryError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner.create_indexes(indices).await.map_err(|e| {
            DirectoryError::StoreUnavailable(format!("Failed to create indexes: {}", e))
        })?;

        Ok(())
    }
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, DirectoryError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| read_error("Find", e))
    }

    /// Find many documents; any cursor error fails the whole read
    pub async fn find_many(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<T>, DirectoryError> {
        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| DirectoryError::StoreUnavailable(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .try_collect()
            .await
            .map_err(|e| read_error("Cursor", e))?;

        debug!(count = results.len(), "find_many complete");
        Ok(results)
    }

    /// Insert a batch of documents, returning how many were written
    pub async fn insert_many(&self, items: Vec<T>) -> Result<usize, DirectoryError> {
        if items.is_empty() {
            return Ok(0);
        }

        let result = self
            .inner
            .insert_many(items)
            .await
            .map_err(|e| DirectoryError::StoreUnavailable(format!("Insert failed: {}", e)))?;

        Ok(result.inserted_ids.len())
    }
}
