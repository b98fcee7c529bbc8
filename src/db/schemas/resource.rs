//! Resource document schema
//!
//! A directory entry describing an external service or information source.
//! Field names match the camelCase layout of the `resources` collection.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::mongo::IntoIndexes;
use crate::types::DirectoryError;

/// Collection name for resources
pub const RESOURCE_COLLECTION: &str = "resources";

/// Top-level directory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Education,
    Health,
    Careers,
    LifeLeisure,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Education,
        Category::Health,
        Category::Careers,
        Category::LifeLeisure,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "education",
            Category::Health => "health",
            Category::Careers => "careers",
            Category::LifeLeisure => "life-leisure",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DirectoryError::InvalidArgument(format!("Unknown category: {}", s)))
    }
}

/// Which kind of organization provides the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subcategory {
    Federal,
    State,
    Ngo,
    Local,
}

impl Subcategory {
    pub const ALL: [Subcategory; 4] = [
        Subcategory::Federal,
        Subcategory::State,
        Subcategory::Ngo,
        Subcategory::Local,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcategory::Federal => "federal",
            Subcategory::State => "state",
            Subcategory::Ngo => "ngo",
            Subcategory::Local => "local",
        }
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subcategory {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subcategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DirectoryError::InvalidArgument(format!("Unknown subcategory: {}", s)))
    }
}

/// Resource document stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// MongoDB document ID
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub title: String,

    pub category: Category,

    pub subcategory: Subcategory,

    pub description: String,

    /// Long-form body (markdown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    pub url: String,

    /// Eligibility tags (e.g. "veteran", "spouse")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<Vec<String>>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium_content: Option<bool>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date_added: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_updated: DateTime<Utc>,
}

impl Resource {
    /// Check the required-field invariants
    pub fn validate(&self) -> Result<(), DirectoryError> {
        for (field, value) in [
            ("title", &self.title),
            ("url", &self.url),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(DirectoryError::InvalidResource(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Hex form of the document ID
    pub fn id_hex(&self) -> String {
        self.id.to_hex()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_eligible(&self, tag: &str) -> bool {
        self.eligibility
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

impl IntoIndexes for Resource {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (doc! { "category": 1, "subcategory": 1 }, None),
            (doc! { "tags": 1 }, None),
            (doc! { "eligibility": 1 }, None),
            // Matches the listing sort
            (
                doc! { "featured": -1, "dateAdded": -1 },
                Some(
                    IndexOptions::builder()
                        .name("featured_recent".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

/// Resource as submitted for import, before it has an ID
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDraft {
    pub title: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub description: String,
    #[serde(default)]
    pub content: Option<String>,
    pub url: String,
    #[serde(default)]
    pub eligibility: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_premium_content: Option<bool>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
}

impl ResourceDraft {
    /// Assign an ID and timestamps, then validate
    pub fn into_resource(self, now: DateTime<Utc>) -> Result<Resource, DirectoryError> {
        let resource = Resource {
            id: ObjectId::new(),
            title: self.title,
            category: self.category,
            subcategory: self.subcategory,
            description: self.description,
            content: self.content,
            url: self.url,
            eligibility: self.eligibility,
            tags: self.tags,
            featured: self.featured,
            is_premium_content: self.is_premium_content,
            date_added: self.date_added.unwrap_or(now),
            last_updated: now,
        };
        resource.validate()?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_json() -> serde_json::Value {
        serde_json::json!({
            "title": "GI Bill",
            "category": "education",
            "subcategory": "federal",
            "description": "Education benefits",
            "url": "https://www.va.gov/education/",
            "tags": ["gi-bill", "tuition"],
            "featured": true
        })
    }

    #[test]
    fn test_category_round_trips_through_str() {
        assert_eq!("life-leisure".parse::<Category>().unwrap(), Category::LifeLeisure);
        assert_eq!(Category::LifeLeisure.to_string(), "life-leisure");
        assert!("sports".parse::<Category>().is_err());
        assert!("Federal".parse::<Subcategory>().is_err());
    }

    #[test]
    fn test_draft_into_resource() {
        let draft: ResourceDraft = serde_json::from_value(draft_json()).unwrap();
        let now = Utc::now();
        let resource = draft.into_resource(now).unwrap();

        assert_eq!(resource.category, Category::Education);
        assert_eq!(resource.date_added, now);
        assert!(resource.has_tag("tuition"));
        assert!(!resource.is_eligible("veteran"));
    }

    #[test]
    fn test_draft_rejects_blank_title() {
        let mut json = draft_json();
        json["title"] = serde_json::json!("   ");
        let draft: ResourceDraft = serde_json::from_value(json).unwrap();
        let err = draft.into_resource(Utc::now()).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidResource(_)));
    }

    #[test]
    fn test_draft_rejects_unknown_category() {
        let mut json = draft_json();
        json["category"] = serde_json::json!("sports");
        assert!(serde_json::from_value::<ResourceDraft>(json).is_err());
    }

    #[test]
    fn test_bson_layout_uses_stored_field_names() {
        let draft: ResourceDraft = serde_json::from_value(draft_json()).unwrap();
        let resource = draft.into_resource(Utc::now()).unwrap();
        let doc = bson::to_document(&resource).unwrap();

        assert!(doc.get_object_id("_id").is_ok());
        assert_eq!(doc.get_str("category").unwrap(), "education");
        assert!(doc.get_datetime("dateAdded").is_ok());
        assert!(doc.get_datetime("lastUpdated").is_ok());
        assert!(!doc.contains_key("isPremiumContent"));

        let back: Resource = bson::from_document(doc).unwrap();
        assert_eq!(back.id, resource.id);
    }
}
