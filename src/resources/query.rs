//! Typed resource query
//!
//! A [`ResourceFilter`] is normalized into a list of [`Predicate`]s plus the
//! fixed listing order and result cap. The same query renders a MongoDB filter
//! document and evaluates against in-memory records, so both stores agree on
//! what a listing returns.

use bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

use super::filter::ResourceFilter;
use crate::db::schemas::{Category, Resource, Subcategory};
use crate::types::{DirectoryError, Result};

/// Maximum records returned by a listing
pub const RESULT_LIMIT: i64 = 100;

/// Case-insensitive literal text matched against title or description
#[derive(Debug, Clone)]
pub struct TextPattern {
    text: String,
    regex: Regex,
}

impl TextPattern {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let regex = RegexBuilder::new(&regex::escape(&text))
            .case_insensitive(true)
            .build()
            .map_err(|e| DirectoryError::InvalidArgument(format!("Bad search text: {}", e)))?;
        Ok(Self { text, regex })
    }

    /// The text as the caller supplied it
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pattern handed to `$regex`; user text never acts as regex syntax
    pub fn escaped(&self) -> String {
        regex::escape(&self.text)
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

/// A single narrowing condition; a query is the AND of its predicates
#[derive(Debug, Clone)]
pub enum Predicate {
    Category(Category),
    Subcategory(Subcategory),
    /// Record's eligibility list contains this tag
    Eligibility(String),
    /// Record's tags intersect this list
    AnyTag(Vec<String>),
    Featured(bool),
    /// Title OR description contains the text
    TextSearch(TextPattern),
}

impl Predicate {
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Predicate::Category(category) => resource.category == *category,
            Predicate::Subcategory(subcategory) => resource.subcategory == *subcategory,
            Predicate::Eligibility(tag) => resource.is_eligible(tag),
            Predicate::AnyTag(tags) => tags.iter().any(|t| resource.has_tag(t)),
            Predicate::Featured(featured) => resource.featured == *featured,
            Predicate::TextSearch(pattern) => {
                pattern.is_match(&resource.title) || pattern.is_match(&resource.description)
            }
        }
    }

    fn apply_to(&self, filter: &mut Document) {
        match self {
            Predicate::Category(category) => {
                filter.insert("category", category.as_str());
            }
            Predicate::Subcategory(subcategory) => {
                filter.insert("subcategory", subcategory.as_str());
            }
            Predicate::Eligibility(tag) => {
                filter.insert("eligibility", doc! { "$in": [tag.clone()] });
            }
            Predicate::AnyTag(tags) => {
                filter.insert("tags", doc! { "$in": tags.clone() });
            }
            Predicate::Featured(featured) => {
                filter.insert("featured", *featured);
            }
            Predicate::TextSearch(pattern) => {
                let or: Vec<Bson> = ["title", "description"]
                    .into_iter()
                    .map(|field| {
                        Bson::Document(doc! {
                            field: { "$regex": pattern.escaped(), "$options": "i" }
                        })
                    })
                    .collect();
                filter.insert("$or", or);
            }
        }
    }
}

/// Validated query: predicates, listing order and cap
#[derive(Debug, Clone)]
pub struct ResourceQuery {
    predicates: Vec<Predicate>,
    limit: i64,
}

impl ResourceQuery {
    /// Normalize a filter.
    ///
    /// Blank eligibility, blank search text and an empty tag list narrow
    /// nothing, matching how an unset field behaves.
    pub fn from_filter(filter: &ResourceFilter) -> Result<Self> {
        let mut predicates = Vec::new();

        if let Some(category) = filter.category {
            predicates.push(Predicate::Category(category));
        }

        if let Some(subcategory) = filter.subcategory {
            predicates.push(Predicate::Subcategory(subcategory));
        }

        if let Some(ref eligibility) = filter.eligibility {
            if !eligibility.is_empty() {
                predicates.push(Predicate::Eligibility(eligibility.clone()));
            }
        }

        // Tags are kept as given; `[""]` matches only records tagged ""
        if let Some(ref tags) = filter.tags {
            if !tags.is_empty() {
                predicates.push(Predicate::AnyTag(tags.clone()));
            }
        }

        if let Some(featured) = filter.featured {
            predicates.push(Predicate::Featured(featured));
        }

        if let Some(ref search) = filter.search {
            if !search.is_empty() {
                predicates.push(Predicate::TextSearch(TextPattern::new(search.clone())?));
            }
        }

        Ok(Self {
            predicates,
            limit: RESULT_LIMIT,
        })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// True when every predicate holds
    pub fn matches(&self, resource: &Resource) -> bool {
        self.predicates.iter().all(|p| p.matches(resource))
    }

    /// Render the MongoDB filter document
    pub fn to_filter(&self) -> Document {
        let mut filter = doc! {};
        for predicate in &self.predicates {
            predicate.apply_to(&mut filter);
        }
        filter
    }

    /// Featured first, then newest
    pub fn sort_document() -> Document {
        doc! { "featured": -1, "dateAdded": -1 }
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .sort(Self::sort_document())
            .limit(self.limit)
            .build()
    }

    /// Listing order between two records
    pub fn rank(a: &Resource, b: &Resource) -> Ordering {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.date_added.cmp(&a.date_added))
    }

    /// Evaluate against in-memory records: filter, order, cap
    pub fn apply<'a, I>(&self, records: I) -> Vec<Resource>
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let mut matched: Vec<Resource> = records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        matched.sort_by(Self::rank);
        matched.truncate(self.limit as usize);
        matched
    }
}
