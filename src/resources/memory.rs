//! In-memory resource store
//!
//! Evaluates [`ResourceQuery`] directly against a vector of records. Used in
//! dev mode (no MongoDB) and by tests, which also read the call counter to
//! check that a request never reached the store.

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::query::ResourceQuery;
use super::store::ResourceStore;
use crate::db::schemas::Resource;
use crate::types::{DirectoryError, Result};

#[derive(Default)]
pub struct InMemoryResourceStore {
    records: RwLock<Vec<Resource>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Resource>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Default::default()
        }
    }

    /// Number of store operations served or refused so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulate the store being unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::StoreUnavailable(
                "in-memory store marked unavailable".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn find(&self, query: &ResourceQuery) -> Result<Vec<Resource>> {
        self.enter()?;
        let records = self.records.read().await;
        Ok(query.apply(records.iter()))
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Resource>> {
        self.enter()?;
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == *id).cloned())
    }

    async fn insert_many(&self, resources: Vec<Resource>) -> Result<usize> {
        self.enter()?;
        let mut records = self.records.write().await;
        if let Some(dup) = resources
            .iter()
            .find(|new| records.iter().any(|r| r.id == new.id))
        {
            return Err(DirectoryError::InvalidResource(format!(
                "duplicate _id {}",
                dup.id
            )));
        }
        let count = resources.len();
        records.extend(resources);
        Ok(count)
    }
}
