//! The principal on whose behalf a listing runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role name that bypasses owner scoping.
pub const ADMIN_ROLE: &str = "admin";

/// The acting user, passed through to a model's filtering capability so it
/// can scope results to what that user may see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorContext {
    /// The acting user's ID.
    pub user_id: Uuid,
    /// The username.
    pub username: String,
    /// Role names held by the user.
    #[serde(default)]
    pub roles: Vec<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl ActorContext {
    /// Creates a new actor context.
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles: Vec::new(),
            request_time: Utc::now(),
        }
    }

    /// Grant a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Returns whether the actor holds the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns whether the actor is an admin.
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}
