//! # Microsoft identity platform client
//!
//! A stateless wrapper around a typed `oauth2` client for the v2.0 endpoints of the
//! configured authority. Nothing is remembered between calls; the session-bound state
//! (state nonce, PKCE verifier, token cache) is passed in and handed back by the caller.
//!
//! ## Types
//!
//! - [`IdTokenFields`]: extra token-response field capturing the `id_token`.
//! - [`IdTokenClaims`]: the handful of id-token claims kept for logging and for marking
//!   the session as externally authenticated. They are decoded without signature
//!   verification and must never drive access control.
//! - [`MicrosoftOAuth`]: builds authorization URLs and redeems authorization codes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse, BasicTokenType,
};
use oauth2::{
    AuthorizationCode, Client, CsrfToken, EndpointNotSet, EndpointSet, ExtraTokenFields, PkceCodeChallenge,
    PkceCodeVerifier, RequestTokenError, Scope, StandardRevocableToken, StandardTokenResponse, TokenResponse,
};
use serde::{Deserialize, Serialize};
use url::Url;

use super::config::OAuthConfig;
use super::token_cache::{CachedAccount, TokenCache};

/// Token response fields beyond the OAuth2 standard ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type MicrosoftTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = Client<
    BasicErrorResponse,
    MicrosoftTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Identity claims taken from the id token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Object id of the user in the tenant.
    #[serde(default)]
    pub oid: Option<String>,
    /// Tenant id.
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a JWT. Returns `None` for anything that is not a
    /// three-part token with a JSON payload.
    pub fn from_jwt(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Key of the account in the token cache.
    pub fn home_account_id(&self) -> String {
        match (&self.oid, &self.tid, &self.sub) {
            (Some(oid), Some(tid), _) => format!("{oid}.{tid}"),
            (Some(oid), None, _) => oid.clone(),
            (None, _, Some(sub)) => sub.clone(),
            (None, _, None) => "unknown".to_string(),
        }
    }

    /// Best human-readable identifier for log lines.
    pub fn display_name(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("unknown")
    }
}

/// Everything the caller must persist for the authorization request.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: CsrfToken,
    pub pkce_verifier: PkceCodeVerifier,
}

/// Outcome of a successful code redemption.
#[derive(Debug)]
pub struct Redemption {
    pub claims: Option<IdTokenClaims>,
    /// The cache passed in, updated with the new tokens.
    pub cache: TokenCache,
}

/// Microsoft identity platform handler.
#[derive(Debug, Clone)]
pub struct MicrosoftOAuth {
    config: OAuthConfig,
}

impl MicrosoftOAuth {
    pub fn new(config: OAuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn create_client(&self) -> ConfiguredClient {
        Client::new(self.config.client_id.clone())
            .set_client_secret(self.config.client_secret.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_redirect_uri(self.config.redirect_url.clone())
    }

    /// Generate an authorization URL with a fresh 256-bit state and a PKCE challenge.
    pub fn authorization_request(&self) -> AuthorizationRequest {
        let client = self.create_client();
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, state) = client
            .authorize_url(|| CsrfToken::new_random_len(32))
            .add_scopes(self.config.requested_scopes().into_iter().map(Scope::new))
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url,
            state,
            pkce_verifier,
        }
    }

    /// Exchange an authorization code for tokens and fold them into `cache`.
    ///
    /// The error string describes the provider or transport failure and is safe to show
    /// to the user: it never contains token material or the raw response body.
    pub async fn redeem_code(
        &self,
        code: &str,
        pkce_verifier: Option<String>,
        mut cache: TokenCache,
    ) -> Result<Redemption, String> {
        // Create HTTP client for token exchange
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| format!("Token exchange failed: {}", e))?;

        let client = self.create_client();

        let mut request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .add_extra_param("scope", self.config.requested_scopes().join(" "));
        if let Some(verifier) = pkce_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier));
        }

        let token = request
            .request_async(&http_client)
            .await
            .map_err(describe_token_error)?;

        if token.access_token().secret().is_empty() {
            return Err("Token exchange failed: empty access token".to_string());
        }

        let id_token = token.extra_fields().id_token.clone();
        let claims = id_token.as_deref().and_then(IdTokenClaims::from_jwt);
        let account_key = claims
            .as_ref()
            .map(IdTokenClaims::home_account_id)
            .unwrap_or_else(|| "default".to_string());

        cache.insert(
            account_key,
            CachedAccount {
                access_token: token.access_token().clone(),
                refresh_token: token.refresh_token().cloned(),
                id_token,
                scopes: token
                    .scopes()
                    .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
                    .unwrap_or_default(),
                expires_at: token
                    .expires_in()
                    .and_then(|d| chrono::Duration::from_std(d).ok())
                    .map(|d| Utc::now() + d),
            },
        );

        Ok(Redemption { claims, cache })
    }

    /// Provider sign-out URL that returns the browser to `post_logout_redirect`.
    pub fn logout_url(&self, post_logout_redirect: &str) -> Url {
        let mut url = self.config.logout_url.clone();
        url.query_pairs_mut()
            .append_pair("post_logout_redirect_uri", post_logout_redirect);
        url
    }
}

fn describe_token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => match response.error_description() {
            Some(description) => format!("{}: {}", response.error(), description),
            None => response.error().to_string(),
        },
        RequestTokenError::Request(e) => format!("Token exchange failed: {}", e),
        // The body may contain tokens; only the parse error is reported.
        RequestTokenError::Parse(e, _) => format!("Token exchange failed: unreadable response ({})", e),
        RequestTokenError::Other(message) => format!("Token exchange failed: {}", message),
    }
}
