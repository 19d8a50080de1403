//! Filtered listing and pagination.

mod common;

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use apix_core::config::PaginationConfig;
use apix_core::types::{
    ActorContext, FilterField, FilterOp, FilterRequest, FilterValue, Page, PaginationMode,
    QueryExtras, QueryScope, Record, SortField,
};
use apix_repository::{GenericRepository, MemoryModel};

use common::{Post, attrs, post_repository, seeded_repository};

fn titles(page: &Page<Post>) -> Vec<String> {
    page.items().iter().map(|p| p.title.clone()).collect()
}

#[tokio::test]
async fn test_empty_match_is_an_empty_page() {
    let repo = post_repository();

    let page = repo
        .list(&FilterRequest::new(), None, None, &QueryExtras::new())
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total_items(), Some(0));
    assert!(!page.has_more());

    let seeded = seeded_repository(3).await;
    let filtered = seeded
        .list(
            &FilterRequest::new().filter("status", FilterValue::String("archived".into())),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();
    assert!(filtered.is_empty());
}

#[tokio::test]
async fn test_with_pages_true_counts_totals() {
    let repo = seeded_repository(7).await;

    let page = repo
        .list(
            &FilterRequest::new().with_pages(true).per_page(3).page(2),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();

    let Page::LengthAware(page) = page else {
        panic!("expected a length-aware page");
    };
    assert_eq!(page.total_items, 7);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 2);
    assert!(page.has_next);
    assert!(page.has_previous);
    assert_eq!(
        page.items.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["Post 4", "Post 5", "Post 6"]
    );
}

#[tokio::test]
async fn test_with_pages_false_returns_simple_page() {
    let repo = seeded_repository(5).await;

    let first = repo
        .list(
            &FilterRequest::new().with_pages(false).per_page(2),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();
    assert_eq!(first.mode(), PaginationMode::Simple);
    assert_eq!(first.total_items(), None);
    assert!(first.has_more());
    assert_eq!(titles(&first), vec!["Post 1", "Post 2"]);

    let last = repo
        .list(
            &FilterRequest::new().with_pages(false).per_page(2).page(3),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();
    assert!(!last.has_more());
    assert_eq!(titles(&last), vec!["Post 5"]);
}

#[tokio::test]
async fn test_mode_and_page_size_fall_back_to_config() {
    let model = Arc::new(MemoryModel::<Post>::new("Post"));
    let config = PaginationConfig {
        with_pages: false,
        per_page: 2,
        max_per_page: 3,
    };
    let repo = GenericRepository::new(model, config);
    for i in 0..5 {
        repo.create(attrs(json!({"title": format!("p{i}")})))
            .await
            .unwrap();
    }

    assert_eq!(repo.pagination_mode(None), PaginationMode::Simple);
    assert_eq!(repo.pagination_mode(Some(true)), PaginationMode::LengthAware);

    let page = repo
        .list(&FilterRequest::new(), None, None, &QueryExtras::new())
        .await
        .unwrap();
    assert_eq!(page.mode(), PaginationMode::Simple);
    assert_eq!(page.len(), 2);

    let clamped = repo
        .list(
            &FilterRequest::new().per_page(50),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();
    assert_eq!(clamped.len(), 3);
}

#[tokio::test]
async fn test_request_is_forwarded_unchanged() {
    let repo = seeded_repository(4).await;
    let request = FilterRequest::from_query([
        ("status", "published"),
        ("per_page", "10"),
        ("with_pages", "true"),
        ("sort", "-views"),
    ])
    .unwrap();
    let snapshot = request.clone();

    let page = repo
        .list(&request, None, None, &QueryExtras::new())
        .await
        .unwrap();

    assert_eq!(request, snapshot);
    assert_eq!(titles(&page), vec!["Post 4", "Post 2"]);
    assert_eq!(page.total_items(), Some(2));
}

#[tokio::test]
async fn test_search_and_sort() {
    let repo = post_repository();
    for (title, body) in [("Rust tips", "ownership"), ("Go tips", "channels"), ("Cooking", "rust removal")] {
        repo.create(attrs(json!({"title": title, "body": body})))
            .await
            .unwrap();
    }

    let page = repo
        .list(
            &FilterRequest::new()
                .search("RUST")
                .sort_by(SortField::desc("title")),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();

    assert_eq!(titles(&page), vec!["Rust tips", "Cooking"]);
}

#[tokio::test]
async fn test_scope_constraints_apply_before_filters() {
    let repo = seeded_repository(6).await;
    let scope = QueryScope::new().with(FilterField::new(
        "views",
        FilterOp::Gte,
        FilterValue::Integer(30),
    ));

    let page = repo
        .list(
            &FilterRequest::new().filter("status", FilterValue::String("draft".into())),
            None,
            Some(&scope),
            &QueryExtras::new(),
        )
        .await
        .unwrap();

    assert_eq!(titles(&page), vec!["Post 3", "Post 5"]);
}

#[tokio::test]
async fn test_actor_scoping_by_owner() {
    let alice = ActorContext::new(Uuid::new_v4(), "alice");
    let bob = ActorContext::new(Uuid::new_v4(), "bob");
    let admin = ActorContext::new(Uuid::new_v4(), "root").with_role("admin");

    let model = Arc::new(MemoryModel::<Post>::new("Post").with_owner_field("author_id"));
    let repo = GenericRepository::new(model, PaginationConfig::default());
    for (title, owner) in [("a1", &alice), ("b1", &bob), ("a2", &alice)] {
        repo.create(attrs(json!({"title": title, "author_id": owner.user_id.to_string()})))
            .await
            .unwrap();
    }

    let request = FilterRequest::new();
    let extras = QueryExtras::new();

    let mine = repo.list(&request, Some(&alice), None, &extras).await.unwrap();
    assert_eq!(titles(&mine), vec!["a1", "a2"]);

    let all = repo.list(&request, Some(&admin), None, &extras).await.unwrap();
    assert_eq!(all.len(), 3);

    let anonymous = repo.list(&request, None, None, &extras).await.unwrap();
    assert_eq!(anonymous.len(), 3);
}

#[tokio::test]
async fn test_include_ids_extra() {
    let repo = seeded_repository(5).await;
    let extras = QueryExtras::new().with("include_ids", json!([2, 4, 9]));

    let page = repo
        .list(&FilterRequest::new(), None, None, &extras)
        .await
        .unwrap();

    assert_eq!(titles(&page), vec!["Post 2", "Post 4"]);
}

#[tokio::test]
async fn test_sort_over_mixed_value_types() {
    let repo = GenericRepository::new(
        Arc::new(MemoryModel::<Record>::new("Entry")),
        PaginationConfig::default(),
    );
    for i in 0..23 {
        let rank = if i % 3 == 0 { json!(i.to_string()) } else { json!(i) };
        repo.create(attrs(json!({ "rank": rank }))).await.unwrap();
    }

    let page = repo
        .list(
            &FilterRequest::new()
                .sort_by(SortField::asc("rank"))
                .per_page(100),
            None,
            None,
            &QueryExtras::new(),
        )
        .await
        .unwrap();

    let ranks: Vec<_> = page.items().iter().map(|r| r.get("rank").cloned()).collect();
    assert_eq!(ranks.len(), 23);
    assert_eq!(ranks[0], Some(json!(1)));
    assert_eq!(ranks[14], Some(json!(22)));
    assert_eq!(ranks[15], Some(json!("0")));
    assert_eq!(ranks[22], Some(json!("9")));
}

#[tokio::test]
async fn test_filter_keeps_leading_zero_strings() {
    let repo = GenericRepository::new(
        Arc::new(MemoryModel::<Record>::new("Address")),
        PaginationConfig::default(),
    );
    repo.create(attrs(json!({"zip": "02134", "price": "1.50"})))
        .await
        .unwrap();
    repo.create(attrs(json!({"zip": "2134", "price": "1.5"})))
        .await
        .unwrap();

    for (key, value) in [("zip", "02134"), ("price", "1.50")] {
        let request = FilterRequest::from_query([(key, value)]).unwrap();
        let page = repo
            .list(&request, None, None, &QueryExtras::new())
            .await
            .unwrap();
        assert_eq!(page.len(), 1, "{key}={value}");
        assert_eq!(page.items()[0].get(key), Some(&json!(value)));
    }
}
