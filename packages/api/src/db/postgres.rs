use async_trait::async_trait;
use sqlx::PgPool;

use super::stores::{CredentialStore, PostStore};
use crate::error::{Error, Result};
use crate::models::{Post, PostInput, User};

/// Postgres-backed implementation of every store trait.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT id, username, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT id, username, password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let posts = sqlx::query_as(
            "SELECT id, title, author, body, image_path, created_at, user_id FROM posts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as(
            "SELECT id, title, author, body, image_path, created_at, user_id FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn insert_post(&self, input: &PostInput, image_path: Option<&str>, user_id: i64) -> Result<Post> {
        let post = sqlx::query_as(
            r#"
            INSERT INTO posts (title, author, body, image_path, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, body, image_path, created_at, user_id
            "#,
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.body)
        .bind(image_path)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update_post(&self, id: i64, input: &PostInput, image_path: Option<&str>, user_id: i64) -> Result<Post> {
        let post: Option<Post> = sqlx::query_as(
            r#"
            UPDATE posts
            SET title = $2, author = $3, body = $4, image_path = $5, user_id = $6
            WHERE id = $1
            RETURNING id, title, author, body, image_path, created_at, user_id
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.body)
        .bind(image_path)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        post.ok_or_else(|| Error::NotFound {
            resource: "Post",
            id: id.to_string(),
        })
    }
}
