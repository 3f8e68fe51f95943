//! # Session-bound authentication state
//!
//! [`AuthSession`] wraps a `tower_sessions::Session` and owns the keys the auth flows
//! read and write:
//!
//! | Key | Contents |
//! |-----|----------|
//! | `_user_id` | id of the logged-in user (the principal) |
//! | `state` | state nonce of the pending Microsoft authorization request |
//! | `pkce_verifier` | PKCE verifier of the same request |
//! | `token_cache` | serialized [`TokenCache`] |
//! | `user` | [`IdTokenClaims`] of an external login |
//! | `_flashes` | queued one-shot messages |

use serde::{Deserialize, Serialize};
use tower_sessions::{Expiry, Session};

use super::microsoft::IdTokenClaims;
use super::token_cache::TokenCache;
use crate::error::Result;
use crate::models::User;
use crate::settings::MAX_SESSION_LIFETIME_DAYS;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "_user_id";
pub const SESSION_STATE_KEY: &str = "state";
pub const SESSION_PKCE_VERIFIER_KEY: &str = "pkce_verifier";
pub const SESSION_TOKEN_CACHE_KEY: &str = "token_cache";
pub const SESSION_EXTERNAL_USER_KEY: &str = "user";
pub const SESSION_FLASHES_KEY: &str = "_flashes";

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

/// Typed access to the authentication keys of a session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    session: Session,
}

impl AuthSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn inner(&self) -> &Session {
        &self.session
    }

    /// Id of the logged-in user, if any.
    pub async fn principal(&self) -> Result<Option<i64>> {
        Ok(self.session.get(SESSION_USER_ID_KEY).await?)
    }

    /// Make `user` the principal of this session.
    ///
    /// The session id is replaced first so an id planted before login cannot be reused.
    /// With `remember_days` the session outlives the browser and expires after that many
    /// days of inactivity (at most [`MAX_SESSION_LIFETIME_DAYS`]); without it the cookie
    /// is a browser-session cookie.
    pub async fn login(&self, user: &User, remember_days: Option<u32>) -> Result<()> {
        self.session.cycle_id().await?;
        self.session.insert(SESSION_USER_ID_KEY, user.id).await?;
        self.session.set_expiry(Some(match remember_days {
            Some(days) => {
                let days = days.clamp(1, MAX_SESSION_LIFETIME_DAYS);
                Expiry::OnInactivity(time::Duration::days(i64::from(days)))
            }
            None => Expiry::OnSessionEnd,
        }));
        Ok(())
    }

    pub async fn clear_principal(&self) -> Result<()> {
        self.session.remove::<i64>(SESSION_USER_ID_KEY).await?;
        Ok(())
    }

    pub async fn set_pending_authorization(&self, state: &str, pkce_verifier: &str) -> Result<()> {
        self.session.insert(SESSION_STATE_KEY, state).await?;
        self.session.insert(SESSION_PKCE_VERIFIER_KEY, pkce_verifier).await?;
        Ok(())
    }

    pub async fn state_nonce(&self) -> Result<Option<String>> {
        Ok(self.session.get(SESSION_STATE_KEY).await?)
    }

    /// Remove the pending authorization, returning its PKCE verifier.
    pub async fn take_pending_authorization(&self) -> Result<Option<String>> {
        self.session.remove::<String>(SESSION_STATE_KEY).await?;
        Ok(self.session.remove(SESSION_PKCE_VERIFIER_KEY).await?)
    }

    pub async fn token_cache(&self) -> Result<TokenCache> {
        let blob: Option<String> = self.session.get(SESSION_TOKEN_CACHE_KEY).await?;
        Ok(TokenCache::load(blob.as_deref()))
    }

    pub async fn save_token_cache(&self, cache: &TokenCache) -> Result<()> {
        let blob = cache.to_blob().map_err(|e| crate::error::Error::Internal {
            operation: format!("serialize token cache: {e}"),
        })?;
        self.session.insert(SESSION_TOKEN_CACHE_KEY, blob).await?;
        Ok(())
    }

    pub async fn external_identity(&self) -> Result<Option<IdTokenClaims>> {
        Ok(self.session.get(SESSION_EXTERNAL_USER_KEY).await?)
    }

    pub async fn set_external_identity(&self, claims: &IdTokenClaims) -> Result<()> {
        self.session.insert(SESSION_EXTERNAL_USER_KEY, claims).await?;
        Ok(())
    }

    pub async fn push_flash(&self, category: &str, message: impl Into<String>) -> Result<()> {
        let mut flashes: Vec<Flash> = self.session.get(SESSION_FLASHES_KEY).await?.unwrap_or_default();
        flashes.push(Flash {
            category: category.to_string(),
            message: message.into(),
        });
        self.session.insert(SESSION_FLASHES_KEY, flashes).await?;
        Ok(())
    }

    /// Drain the queued flashes.
    pub async fn take_flashes(&self) -> Result<Vec<Flash>> {
        Ok(self.session.remove(SESSION_FLASHES_KEY).await?.unwrap_or_default())
    }

    /// Drop every key and delete the session from the store.
    pub async fn flush(&self) -> Result<()> {
        Ok(self.session.flush().await?)
    }
}
