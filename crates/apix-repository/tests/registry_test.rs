//! Resolving a repository's model by naming convention.

mod common;

use apix_core::config::{ModelsConfig, PaginationConfig};
use apix_core::error::{AppError, ErrorKind};
use apix_core::traits::{Model, NoHooks};
use apix_repository::{GenericRepository, MemoryModel, ModelRegistry};

use common::Post;

type Registry = ModelRegistry<MemoryModel<Post>>;

#[test]
fn test_model_name_strips_suffix_and_path() {
    assert_eq!(Registry::model_name("PostRepository").unwrap(), "Post");
    assert_eq!(Registry::model_name("blog::repos::PostRepository").unwrap(), "Post");
    assert_eq!(Registry::model_name("app.repositories.PostRepository").unwrap(), "Post");
    assert_eq!(Registry::model_name("Post").unwrap(), "Post");

    let err = Registry::model_name("Repository").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[test]
fn test_qualified_name_uses_configured_namespace() {
    let registry = Registry::from_config(&ModelsConfig::default());
    assert_eq!(
        registry.qualified_name("PostRepository").unwrap(),
        "app.models.Post"
    );
}

#[tokio::test]
async fn test_resolves_registered_model() {
    let shared = MemoryModel::<Post>::new("Post");
    let mut registry = Registry::new("blog.");
    let handle = shared.clone();
    registry.register("Post", move || Ok(handle.clone()));
    assert!(registry.contains("Post"));

    let repo = GenericRepository::from_registry(
        &registry,
        "PostRepository",
        NoHooks,
        PaginationConfig::default(),
    )
    .unwrap();

    repo.create(common::attrs(serde_json::json!({"title": "via registry"})))
        .await
        .unwrap();
    assert_eq!(shared.count().await, 1);
    assert_eq!(repo.model().name(), "Post");
}

#[test]
fn test_unregistered_model_is_configuration_error() {
    let registry = Registry::new("blog.");

    let err = GenericRepository::from_registry(
        &registry,
        "CommentRepository",
        NoHooks,
        PaginationConfig::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Configuration);
    assert!(err.message.contains("blog.Comment"));
}

#[test]
fn test_failing_factory_is_configuration_error() {
    let mut registry = Registry::new("blog.");
    registry.register("Post", || Err(AppError::internal("no connection")));

    let err = registry.resolve("PostRepository").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
    assert!(err.message.contains("no connection"));
}
