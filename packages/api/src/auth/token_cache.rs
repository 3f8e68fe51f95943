//! # Token cache
//!
//! Tokens issued by the identity provider are kept in the user's session as an opaque
//! JSON blob. A [`TokenCache`] is rebuilt from that blob on every callback, updated with
//! the newly redeemed tokens, and written back only when
//! [`has_state_changed`](TokenCache::has_state_changed) reports a modification.
//!
//! Accounts are keyed by their home-account id (`<oid>.<tid>`, or the `sub` claim when
//! the object id is missing). Token values use the `oauth2` secret types so they never
//! show up in `Debug` output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use oauth2::{AccessToken, RefreshToken};
use serde::{Deserialize, Serialize};

/// Tokens held for one signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAccount {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    /// Raw id token (JWT) as returned by the provider.
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Serializable cache of provider tokens with change tracking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenCache {
    #[serde(default)]
    accounts: BTreeMap<String, CachedAccount>,
    #[serde(skip)]
    changed: bool,
}

impl TokenCache {
    /// Rebuild a cache from its serialized form.
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    /// Rebuild from the session's blob, starting empty when there is none or it is unreadable.
    pub fn load(blob: Option<&str>) -> Self {
        match blob {
            Some(blob) => Self::from_blob(blob).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable token cache: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Store tokens for `account_key`, replacing what was there.
    pub fn insert(&mut self, account_key: impl Into<String>, account: CachedAccount) {
        self.accounts.insert(account_key.into(), account);
        self.changed = true;
    }

    pub fn account(&self, account_key: &str) -> Option<&CachedAccount> {
        self.accounts.get(account_key)
    }

    /// Whether the cache was modified since it was loaded.
    pub fn has_state_changed(&self) -> bool {
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(token: &str) -> CachedAccount {
        CachedAccount {
            access_token: AccessToken::new(token.to_string()),
            refresh_token: Some(RefreshToken::new("refresh".to_string())),
            id_token: None,
            scopes: vec!["User.Read".to_string()],
            expires_at: None,
        }
    }

    #[test]
    fn test_new_cache_is_unchanged() {
        let cache = TokenCache::load(None);
        assert!(cache.account("oid.tid").is_none());
        assert!(!cache.has_state_changed());
    }

    #[test]
    fn test_insert_marks_changed_and_survives_blob() {
        let mut cache = TokenCache::default();
        cache.insert("oid.tid", account("access-1"));
        assert!(cache.has_state_changed());

        let blob = cache.to_blob().unwrap();
        let reloaded = TokenCache::load(Some(&blob));

        // Change tracking restarts with every load
        assert!(!reloaded.has_state_changed());
        let stored = reloaded.account("oid.tid").unwrap();
        assert_eq!(stored.access_token.secret(), "access-1");
        assert_eq!(stored.scopes, vec!["User.Read".to_string()]);
    }

    #[test]
    fn test_unreadable_blob_starts_empty() {
        let cache = TokenCache::load(Some("{not json"));
        assert_eq!(cache.to_blob().unwrap(), TokenCache::default().to_blob().unwrap());
        assert!(!cache.has_state_changed());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let mut cache = TokenCache::default();
        cache.insert("a", account("very-secret-access-token"));
        assert!(!format!("{cache:?}").contains("very-secret-access-token"));
    }
}
