//! Store traits consumed by the auth flows and the post pages.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Post, PostInput, User};

/// Read-only access to user records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive username lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
}

/// Post persistence.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn find_post(&self, id: i64) -> Result<Option<Post>>;

    async fn insert_post(&self, input: &PostInput, image_path: Option<&str>, user_id: i64) -> Result<Post>;

    /// Overwrite the editable fields of post `id`.
    async fn update_post(&self, id: i64, input: &PostInput, image_path: Option<&str>, user_id: i64) -> Result<Post>;
}
