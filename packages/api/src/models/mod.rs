//! Data models for the application.

mod post;
mod user;

pub use post::{FieldError, Post, PostInput, AUTHOR_MAX_LEN, TITLE_MAX_LEN};
pub use user::{User, UserInfo, ADMIN_USERNAME};
