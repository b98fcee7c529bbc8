//! Resource repository
//!
//! Turns caller filters into store queries and exposes the directory's read
//! conveniences (featured, search, by category, related).

use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::filter::ResourceFilter;
use super::query::ResourceQuery;
use super::store::ResourceStore;
use crate::db::schemas::{Category, Resource, ResourceDraft, Subcategory};
use crate::types::{DirectoryError, Result};

/// Related listings return at most this many records
pub const RELATED_LIMIT: usize = 3;

/// Tags from the source record used to find related records
pub const RELATED_TAG_LIMIT: usize = 3;

#[derive(Clone)]
pub struct ResourceRepository {
    store: Arc<dyn ResourceStore>,
}

impl ResourceRepository {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Records matching every set field of `filter`, featured first then newest
    pub async fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>> {
        let query = ResourceQuery::from_filter(filter)?;
        debug!(predicates = query.predicates().len(), "Listing resources");
        self.store.find(&query).await
    }

    /// Single record by hex ObjectId
    pub async fn get_by_id(&self, id: &str) -> Result<Resource> {
        let oid = parse_id(id)?;
        self.store
            .find_by_id(&oid)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(format!("resource {}", id)))
    }

    pub async fn get_featured(&self, category: Option<Category>) -> Result<Vec<Resource>> {
        let mut filter = ResourceFilter::featured();
        filter.category = category;
        self.list(&filter).await
    }

    /// Text search over title and description; blank text returns nothing
    pub async fn search(&self, text: &str) -> Result<Vec<Resource>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.list(&ResourceFilter::new().with_search(text)).await
    }

    pub async fn get_by_category(&self, category: Category) -> Result<Vec<Resource>> {
        self.list(&ResourceFilter::by_category(category)).await
    }

    pub async fn get_by_subcategory(
        &self,
        category: Category,
        subcategory: Subcategory,
    ) -> Result<Vec<Resource>> {
        self.list(&ResourceFilter::by_category(category).with_subcategory(subcategory))
            .await
    }

    /// Up to three records sharing the source's category and any of its first
    /// three tags.
    ///
    /// A source without tags narrows by category alone, so results may share
    /// nothing with the source beyond its category.
    pub async fn get_related(&self, id: &str) -> Result<Vec<Resource>> {
        let source = self.get_by_id(id).await?;

        let mut filter = ResourceFilter::by_category(source.category);
        if !source.tags.is_empty() {
            filter = filter.with_tags(source.tags.iter().take(RELATED_TAG_LIMIT).cloned());
        }

        let related: Vec<Resource> = self
            .list(&filter)
            .await?
            .into_iter()
            .filter(|r| r.id != source.id)
            .take(RELATED_LIMIT)
            .collect();

        debug!(source = %source.id, count = related.len(), "Related resources");
        Ok(related)
    }

    /// Validate drafts and insert them; nothing is written if any draft fails
    pub async fn import(&self, drafts: Vec<ResourceDraft>) -> Result<Vec<Resource>> {
        let now = Utc::now();
        let resources = drafts
            .into_iter()
            .map(|d| d.into_resource(now))
            .collect::<Result<Vec<_>>>()?;

        let written = self.store.insert_many(resources.clone()).await?;
        info!(count = written, "Imported resources");
        Ok(resources)
    }
}

/// Parse a hex ObjectId before any store access
pub fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| DirectoryError::InvalidIdentifier(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_id(&oid.to_hex()).unwrap(), oid);
        assert!(matches!(
            parse_id("not-a-valid-key"),
            Err(DirectoryError::InvalidIdentifier(_))
        ));
        assert!(parse_id("").is_err());
    }
}
