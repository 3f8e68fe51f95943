//! # Post model
//!
//! [`Post`] is a `posts` row. [`PostInput`] is the validated form payload used for
//! both creating and editing; [`PostInput::validate`] applies the form rules (all text
//! fields required after trimming, title capped at [`TITLE_MAX_LEN`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TITLE_MAX_LEN: usize = 150;
pub const AUTHOR_MAX_LEN: usize = 75;

/// Full post record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub body: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

/// Text fields of the post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub author: String,
    pub body: String,
}

/// A field-level validation message.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl PostInput {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            author: post.author.clone(),
            body: post.body.clone(),
        }
    }

    /// Trim every field and check the form rules.
    pub fn validate(self) -> Result<Self, (Self, Vec<FieldError>)> {
        let input = Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            body: self.body.trim().to_string(),
        };

        let mut errors = Vec::new();
        for (field, value, max) in [
            ("title", &input.title, Some(TITLE_MAX_LEN)),
            ("author", &input.author, Some(AUTHOR_MAX_LEN)),
            ("body", &input.body, None),
        ] {
            if value.is_empty() {
                errors.push(FieldError {
                    field,
                    message: "This field is required.".to_string(),
                });
            } else if let Some(max) = max.filter(|max| value.chars().count() > *max) {
                errors.push(FieldError {
                    field,
                    message: format!("Field cannot be longer than {max} characters."),
                });
            }
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err((input, errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_fields() {
        let input = PostInput {
            title: "  Hello  ".into(),
            author: "Ada".into(),
            body: "\nBody text\n".into(),
        };

        let valid = input.validate().unwrap();
        assert_eq!(valid.title, "Hello");
        assert_eq!(valid.body, "Body text");
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let input = PostInput {
            title: "   ".into(),
            author: String::new(),
            body: "ok".into(),
        };

        let (_, errors) = input.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "author"]);
    }

    #[test]
    fn test_validate_title_length() {
        let input = PostInput {
            title: "x".repeat(TITLE_MAX_LEN + 1),
            author: "Ada".into(),
            body: "ok".into(),
        };

        let (_, errors) = input.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
    }
}
