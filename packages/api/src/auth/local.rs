//! Username and password login against the [`CredentialStore`].

use super::password::verify_password;
use super::AuthResult;
use crate::db::CredentialStore;
use crate::error::{Error, Result};

/// Check `password` for `username`.
///
/// Every failure is [`AuthResult::InvalidCredentials`], whether the user is unknown, the
/// password is wrong, or the stored hash cannot be parsed. Only store failures are errors.
pub async fn authenticate(users: &dyn CredentialStore, username: &str, password: &str) -> Result<AuthResult> {
    let Some(user) = users.find_by_username(username).await? else {
        tracing::info!(username, "login failed");
        return Ok(AuthResult::InvalidCredentials);
    };

    let valid = match verify_password(password, &user.password_hash) {
        Ok(valid) => valid,
        Err(Error::Internal { .. }) => {
            tracing::warn!(username, "stored password hash is unreadable");
            false
        }
        Err(e) => return Err(e),
    };

    if !valid {
        tracing::info!(username, "login failed");
        return Ok(AuthResult::InvalidCredentials);
    }

    tracing::info!(username, "login succeeded");
    Ok(AuthResult::Success(user))
}
