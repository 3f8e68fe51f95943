//! Microsoft identity platform endpoints and app credentials.

use std::time::Duration;

use config::ConfigError;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use url::Url;

use crate::error::{Error, Result};
use crate::settings::Settings;

/// Scopes the identity platform always needs to issue an id token and a refresh token.
pub const RESERVED_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub logout_url: Url,
    /// Callback URI; identical for the authorization request and the code redemption.
    pub redirect_url: RedirectUrl,
    /// Application scopes, without [`RESERVED_SCOPES`].
    pub scopes: Vec<String>,
    pub timeout: Duration,
}

impl OAuthConfig {
    /// Build the Microsoft configuration from `AUTHORITY`, `CLIENT_ID`, `CLIENT_SECRET`,
    /// `REDIRECT_PATH` and `SCOPE`.
    pub fn microsoft(settings: &Settings) -> Result<Self> {
        let authority = settings.authority.trim_end_matches('/');
        let endpoint = |name: &str| format!("{authority}/oauth2/v2.0/{name}");

        Ok(Self {
            client_id: ClientId::new(settings.client_id.clone()),
            client_secret: ClientSecret::new(settings.client_secret.clone()),
            auth_url: AuthUrl::new(endpoint("authorize")).map_err(|e| invalid("AUTHORITY", e))?,
            token_url: TokenUrl::new(endpoint("token")).map_err(|e| invalid("AUTHORITY", e))?,
            logout_url: Url::parse(&endpoint("logout")).map_err(|e| invalid("AUTHORITY", e))?,
            redirect_url: RedirectUrl::new(settings.external_url(&settings.redirect_path))
                .map_err(|e| invalid("BASE_URL/REDIRECT_PATH", e))?,
            scopes: settings
                .scope
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && !RESERVED_SCOPES.contains(&s.as_str()))
                .collect(),
            timeout: Duration::from_secs(settings.oauth_timeout_secs),
        })
    }

    /// Application scopes followed by the reserved ones.
    pub fn requested_scopes(&self) -> Vec<String> {
        self.scopes
            .iter()
            .cloned()
            .chain(RESERVED_SCOPES.iter().map(|s| s.to_string()))
            .collect()
    }
}

fn invalid(name: &str, err: impl std::fmt::Display) -> Error {
    Error::Config(ConfigError::Message(format!("invalid {name}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microsoft_endpoints() {
        let mut settings = Settings::defaults().unwrap();
        settings.authority = "https://login.microsoftonline.com/contoso/".into();
        settings.base_url = "https://blog.example.com".into();
        settings.scope = vec!["User.Read".into(), "openid".into()];

        let config = OAuthConfig::microsoft(&settings).unwrap();

        assert_eq!(config.auth_url.as_str(), "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize");
        assert_eq!(config.token_url.as_str(), "https://login.microsoftonline.com/contoso/oauth2/v2.0/token");
        assert_eq!(config.logout_url.as_str(), "https://login.microsoftonline.com/contoso/oauth2/v2.0/logout");
        assert_eq!(config.redirect_url.as_str(), "https://blog.example.com/getAToken");
        assert_eq!(config.scopes, vec!["User.Read".to_string()]);
        assert_eq!(
            config.requested_scopes(),
            vec!["User.Read", "openid", "profile", "offline_access"]
        );
    }

    #[test]
    fn test_invalid_authority() {
        let mut settings = Settings::defaults().unwrap();
        settings.authority = "not a url".into();

        let err = OAuthConfig::microsoft(&settings).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
