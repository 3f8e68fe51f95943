use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::stores::{CredentialStore, PostStore};
use crate::error::{Error, Result};
use crate::models::{Post, PostInput, User};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    next_user_id: i64,
    next_post_id: i64,
}

/// In-memory store for testing and local development without Postgres.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a user. Usernames are unique; an existing record is replaced.
    pub fn add_user(&self, username: &str, password_hash: &str) -> User {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.users.values().find(|u| u.username == username).map(|u| u.id);
        let id = match existing {
            Some(id) => id,
            None => {
                tables.next_user_id += 1;
                tables.next_user_id
            }
        };
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(id, user.clone());
        user
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let tables = self.tables.lock().unwrap();
        // ids are monotonic, so reverse id order is newest first
        Ok(tables.posts.values().rev().cloned().collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.tables.lock().unwrap().posts.get(&id).cloned())
    }

    async fn insert_post(&self, input: &PostInput, image_path: Option<&str>, user_id: i64) -> Result<Post> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_post_id += 1;
        let post = Post {
            id: tables.next_post_id,
            title: input.title.clone(),
            author: input.author.clone(),
            body: input.body.clone(),
            image_path: image_path.map(str::to_string),
            created_at: Utc::now(),
            user_id,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, input: &PostInput, image_path: Option<&str>, user_id: i64) -> Result<Post> {
        let mut tables = self.tables.lock().unwrap();
        let post = tables.posts.get_mut(&id).ok_or_else(|| Error::NotFound {
            resource: "Post",
            id: id.to_string(),
        })?;
        post.title = input.title.clone();
        post.author = input.author.clone();
        post.body = input.body.clone();
        post.image_path = image_path.map(str::to_string);
        post.user_id = user_id;
        Ok(post.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            author: "Ada".to_string(),
            body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_users_lookup() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin", "hash-1");
        store.add_user("editor", "hash-2");

        let found = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
        assert!(store.find_by_username("ADMIN").await.unwrap().is_none());
        assert_eq!(store.find_by_id(admin.id).await.unwrap().unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_add_user_keeps_usernames_unique() {
        let store = MemoryStore::new();
        let first = store.add_user("admin", "old");
        let second = store.add_user("admin", "new");

        assert_eq!(first.id, second.id);
        let found = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new");
    }

    #[tokio::test]
    async fn test_posts_newest_first() {
        let store = MemoryStore::new();
        store.insert_post(&input("first"), None, 1).await.unwrap();
        store.insert_post(&input("second"), Some("a.png"), 1).await.unwrap();

        let posts = store.list_posts().await.unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(posts[0].image_path.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let store = MemoryStore::new();
        let err = store.update_post(42, &input("x"), None, 1).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { resource: "Post", .. }));
    }
}
