//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use apix_core::config::PaginationConfig;
use apix_core::traits::Entity;
use apix_core::types::{Attributes, EntityId};
use apix_repository::{GenericRepository, MemoryModel};

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub author_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    "draft".to_string()
}

impl Entity for Post {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Build an attribute map from a JSON object literal.
pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        other => panic!("attributes must be a JSON object, got {other}"),
    }
}

pub fn post_model() -> MemoryModel<Post> {
    MemoryModel::new("Post")
}

pub fn post_repository() -> GenericRepository<MemoryModel<Post>> {
    GenericRepository::new(Arc::new(post_model()), PaginationConfig::default())
}

/// A repository with `count` posts titled `Post 1`..`Post n`.
pub async fn seeded_repository(count: usize) -> GenericRepository<MemoryModel<Post>> {
    let repo = post_repository();
    for i in 1..=count {
        repo.create(attrs(serde_json::json!({
            "title": format!("Post {i}"),
            "views": i as i64 * 10,
            "status": if i % 2 == 0 { "published" } else { "draft" },
        })))
        .await
        .expect("seed post");
    }
    repo
}
