//! Resource repository integration tests against the in-memory store

use bson::oid::ObjectId;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use vet1stop::db::schemas::{Category, Resource, ResourceDraft, Subcategory};
use vet1stop::resources::{InMemoryResourceStore, ResourceFilter, ResourceRepository};
use vet1stop::DirectoryError;

fn resource(title: &str, category: Category, tags: &[&str], featured: bool, age_days: i64) -> Resource {
    let added = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::days(age_days);
    Resource {
        id: ObjectId::new(),
        title: title.to_string(),
        category,
        subcategory: Subcategory::Federal,
        description: format!("{} description", title),
        content: None,
        url: format!("https://example.org/{}", title.to_lowercase().replace(' ', "-")),
        eligibility: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        featured,
        is_premium_content: None,
        date_added: added,
        last_updated: added,
    }
}

fn repository(records: Vec<Resource>) -> (ResourceRepository, Arc<InMemoryResourceStore>) {
    let store = Arc::new(InMemoryResourceStore::with_records(records));
    (ResourceRepository::new(store.clone()), store)
}

fn abc() -> Vec<Resource> {
    vec![
        resource("A", Category::Education, &["gi-bill", "tuition"], true, 10),
        resource("B", Category::Education, &["tuition"], false, 1),
        resource("C", Category::Health, &["gi-bill"], false, 0),
    ]
}

fn titles(records: &[Resource]) -> Vec<&str> {
    records.iter().map(|r| r.title.as_str()).collect()
}

#[tokio::test]
async fn test_category_listing_orders_featured_first() {
    let (repo, _) = repository(abc());

    let education = repo
        .list(&ResourceFilter::by_category(Category::Education))
        .await
        .unwrap();
    assert_eq!(titles(&education), vec!["A", "B"]);
}

#[tokio::test]
async fn test_category_filter_only_returns_that_category() {
    let (repo, _) = repository(abc());

    for category in Category::ALL {
        let records = repo.get_by_category(category).await.unwrap();
        assert!(records.iter().all(|r| r.category == category));
    }
}

#[tokio::test]
async fn test_tags_filter_matches_any_tag() {
    let mut records = abc();
    records.push(resource("D", Category::Careers, &["resume"], false, 3));
    let (repo, _) = repository(records);

    let filter = ResourceFilter::new().with_tags(["gi-bill", "resume"]);
    let found = repo.list(&filter).await.unwrap();

    assert_eq!(found.len(), 3);
    assert!(found
        .iter()
        .all(|r| r.has_tag("gi-bill") || r.has_tag("resume")));
}

#[tokio::test]
async fn test_blank_tag_does_not_widen_tag_filter() {
    let records = vec![
        resource("A", Category::Education, &["gi-bill"], false, 0),
        resource("B", Category::Education, &[], false, 1),
    ];
    let (repo, _) = repository(records);

    let found = repo.list(&ResourceFilter::new().with_tags([""])).await.unwrap();
    assert!(found.is_empty());

    let mixed = repo
        .list(&ResourceFilter::new().with_tags(["", "gi-bill"]))
        .await
        .unwrap();
    assert_eq!(titles(&mixed), vec!["A"]);
}

#[tokio::test]
async fn test_search_matches_title_or_description_case_insensitively() {
    let mut records = abc();
    let mut fishing = resource("Project Healing Waters", Category::LifeLeisure, &[], false, 2);
    fishing.description = "Fly FISHING programs for disabled veterans".into();
    records.push(fishing);
    let (repo, _) = repository(records);

    let by_description = repo.search("fishing").await.unwrap();
    assert_eq!(titles(&by_description), vec!["Project Healing Waters"]);

    let by_title = repo.search("healing waters").await.unwrap();
    assert_eq!(titles(&by_title), vec!["Project Healing Waters"]);

    // Regex metacharacters are literal text
    assert!(repo.search("a.*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_and_other_fields_combine() {
    let (repo, _) = repository(abc());

    let filter = ResourceFilter::by_category(Category::Health).with_search("description");
    let found = repo.list(&filter).await.unwrap();
    assert_eq!(titles(&found), vec!["C"]);
}

#[tokio::test]
async fn test_blank_search_never_reaches_store() {
    let (repo, store) = repository(abc());

    assert!(repo.search("").await.unwrap().is_empty());
    assert!(repo.search("   ").await.unwrap().is_empty());
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_results_capped_at_highest_ranked_hundred() {
    // 150 records; every tenth is featured, age increases with index
    let records: Vec<Resource> = (0..150)
        .map(|i| {
            resource(
                &format!("Resource {}", i),
                Category::Careers,
                &["jobs"],
                i % 10 == 0,
                i,
            )
        })
        .collect();
    let (repo, _) = repository(records.clone());

    let listed = repo.list(&ResourceFilter::new()).await.unwrap();
    assert_eq!(listed.len(), 100);

    let mut expected = records;
    expected.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.date_added.cmp(&a.date_added))
    });
    expected.truncate(100);
    assert_eq!(titles(&listed), titles(&expected));

    // 15 featured records lead the page
    assert!(listed[..15].iter().all(|r| r.featured));
    assert!(listed[15..].iter().all(|r| !r.featured));
}

#[tokio::test]
async fn test_featured_within_category() {
    let (repo, _) = repository(abc());

    let featured = repo.get_featured(Some(Category::Education)).await.unwrap();
    assert_eq!(titles(&featured), vec!["A"]);

    assert!(repo
        .get_featured(Some(Category::Health))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(repo.get_featured(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_subcategory_listing() {
    let mut records = abc();
    let mut state = resource("State Benefits", Category::Education, &[], false, 4);
    state.subcategory = Subcategory::State;
    records.push(state);
    let (repo, _) = repository(records);

    let found = repo
        .get_by_subcategory(Category::Education, Subcategory::State)
        .await
        .unwrap();
    assert_eq!(titles(&found), vec!["State Benefits"]);
}

#[tokio::test]
async fn test_get_by_id() {
    let records = abc();
    let a = records[0].clone();
    let (repo, store) = repository(records);

    assert_eq!(repo.get_by_id(&a.id_hex()).await.unwrap(), a);

    assert!(matches!(
        repo.get_by_id(&ObjectId::new().to_hex()).await,
        Err(DirectoryError::NotFound(_))
    ));

    let calls = store.call_count();
    assert!(matches!(
        repo.get_by_id("not-a-valid-key").await,
        Err(DirectoryError::InvalidIdentifier(_))
    ));
    assert_eq!(store.call_count(), calls);
}

#[tokio::test]
async fn test_related_excludes_source_and_caps_at_three() {
    let mut records: Vec<Resource> = (0..6)
        .map(|i| resource(&format!("GI Bill {}", i), Category::Education, &["gi-bill"], false, i))
        .collect();
    records.push(resource("Other", Category::Health, &["gi-bill"], true, 0));
    let source = records[0].clone();
    let (repo, _) = repository(records);

    let related = repo.get_related(&source.id_hex()).await.unwrap();
    assert_eq!(related.len(), 3);
    assert!(related.iter().all(|r| r.id != source.id));
    assert!(related.iter().all(|r| r.category == Category::Education));
}

#[tokio::test]
async fn test_related_without_tags_falls_back_to_category() {
    let records = vec![
        resource("Untagged", Category::Health, &[], false, 0),
        resource("Clinic", Category::Health, &["va"], false, 1),
        resource("School", Category::Education, &["va"], false, 1),
    ];
    let source = records[0].clone();
    let (repo, _) = repository(records);

    let related = repo.get_related(&source.id_hex()).await.unwrap();
    assert_eq!(titles(&related), vec!["Clinic"]);
}

#[tokio::test]
async fn test_related_propagates_lookup_errors() {
    let (repo, _) = repository(abc());

    assert!(matches!(
        repo.get_related("zzz").await,
        Err(DirectoryError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        repo.get_related(&ObjectId::new().to_hex()).await,
        Err(DirectoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_unreachable_store() {
    let (repo, store) = repository(abc());
    store.set_unavailable(true);

    assert!(matches!(
        repo.list(&ResourceFilter::new()).await,
        Err(DirectoryError::StoreUnavailable(_))
    ));
    assert!(matches!(
        repo.get_by_id(&ObjectId::new().to_hex()).await,
        Err(DirectoryError::StoreUnavailable(_))
    ));
}

#[tokio::test]
async fn test_import_is_all_or_nothing() {
    let (repo, store) = repository(Vec::new());

    let drafts: Vec<ResourceDraft> = serde_json::from_value(serde_json::json!([
        {
            "title": "Vet Center",
            "category": "health",
            "subcategory": "federal",
            "description": "Readjustment counseling",
            "url": "https://www.vetcenter.va.gov",
            "tags": ["counseling"]
        },
        {
            "title": "",
            "category": "health",
            "subcategory": "ngo",
            "description": "Missing title",
            "url": "https://example.org"
        }
    ]))
    .unwrap();

    assert!(matches!(
        repo.import(drafts.clone()).await,
        Err(DirectoryError::InvalidResource(_))
    ));
    assert_eq!(store.call_count(), 0);

    let imported = repo.import(drafts[..1].to_vec()).await.unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(
        titles(&repo.get_by_category(Category::Health).await.unwrap()),
        vec!["Vet Center"]
    );
}
