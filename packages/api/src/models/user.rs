//! # User model
//!
//! [`User`] is the full `users` row, including the Argon2 `password_hash`. Accounts are
//! provisioned outside this application; the web flows only read them. The account named
//! [`ADMIN_USERNAME`] is the one every successful Microsoft login is mapped to.
//!
//! [`UserInfo`] is the projection handed to templates: it never carries the hash.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Username of the single account external logins are mapped to.
pub const ADMIN_USERNAME: &str = "admin";

/// Full user record from the database.
#[derive(Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.username == ADMIN_USERNAME
    }

    /// Convert to UserInfo for rendering.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin(),
        }
    }
}

/// User information safe to render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            id: 7,
            username: username.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[test]
    fn test_admin_is_decided_by_username() {
        assert!(user("admin").is_admin());
        assert!(!user("Admin").is_admin());
        assert!(!user("editor").is_admin());
    }

    #[test]
    fn test_info_and_debug_omit_hash() {
        let user = user("editor");

        let info = user.to_info();
        assert_eq!(info.username, "editor");
        assert!(!info.is_admin);

        assert!(!format!("{user:?}").contains("argon2"));
    }
}
