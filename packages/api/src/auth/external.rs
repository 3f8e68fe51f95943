//! # Microsoft login flow
//!
//! [`begin_external_login`] stores a fresh state nonce and PKCE verifier in the session
//! and returns the provider URL to send the browser to. [`handle_callback`] processes the
//! provider's redirect back:
//!
//! 1. the `state` parameter must equal the stored nonce, otherwise
//!    [`AuthResult::StateMismatch`] and nothing else happens. A matching nonce is removed
//!    so it cannot be replayed;
//! 2. an `error` parameter becomes [`AuthResult::ProviderError`] without contacting the
//!    provider;
//! 3. the `code` is redeemed at the token endpoint, folding the tokens into the session's
//!    token cache;
//! 4. the login is mapped to the fixed `admin` account and only then are the id-token
//!    claims recorded in the session;
//! 5. the token cache is written back only when it changed.

use serde::Deserialize;
use url::Url;

use super::microsoft::MicrosoftOAuth;
use super::session::AuthSession;
use super::AuthResult;
use crate::db::CredentialStore;
use crate::error::Result;
use crate::models::ADMIN_USERNAME;

/// Query parameters of the provider callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Start a Microsoft login. Returns the authorization URL and the state nonce stored in
/// the session.
pub async fn begin_external_login(oauth: &MicrosoftOAuth, session: &AuthSession) -> Result<(Url, String)> {
    let request = oauth.authorization_request();
    let state = request.state.secret().clone();

    session
        .set_pending_authorization(&state, request.pkce_verifier.secret())
        .await?;

    Ok((request.url, state))
}

/// Complete a Microsoft login from the callback's query parameters.
///
/// Session store failures are errors; every protocol outcome is an [`AuthResult`]. On
/// `Success` the caller still has to log the returned user in.
pub async fn handle_callback(
    oauth: &MicrosoftOAuth,
    users: &dyn CredentialStore,
    session: &AuthSession,
    params: CallbackParams,
) -> Result<AuthResult> {
    let expected = session.state_nonce().await?;
    let state_matches = matches!(
        (params.state.as_deref(), expected.as_deref()),
        (Some(got), Some(want)) if got == want
    );
    if !state_matches {
        tracing::warn!("OAuth callback state does not match the session");
        return Ok(AuthResult::StateMismatch);
    }
    let pkce_verifier = session.take_pending_authorization().await?;

    if let Some(error) = params.error {
        let message = match params.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        tracing::warn!(error = %message, "identity provider returned an error");
        return Ok(AuthResult::ProviderError(message));
    }

    let Some(code) = params.code else {
        tracing::warn!("OAuth callback carried neither code nor error");
        return Ok(AuthResult::ProviderError("authorization response carried no code".into()));
    };

    let cache = session.token_cache().await?;
    let redemption = match oauth.redeem_code(&code, pkce_verifier, cache).await {
        Ok(redemption) => redemption,
        Err(message) => {
            tracing::warn!(error = %message, "authorization code exchange failed");
            return Ok(AuthResult::ProviderError(message));
        }
    };

    let Some(admin) = users.find_by_username(ADMIN_USERNAME).await? else {
        tracing::error!("external login succeeded but the `{}` account does not exist", ADMIN_USERNAME);
        return Ok(AuthResult::ProviderError("admin account missing".into()));
    };

    let claims = redemption.claims.unwrap_or_default();
    session.set_external_identity(&claims).await?;

    if redemption.cache.has_state_changed() {
        session.save_token_cache(&redemption.cache).await?;
    }

    tracing::info!(external_user = claims.display_name(), "external login succeeded");
    Ok(AuthResult::Success(admin))
}

/// Whether the session was populated by an external login.
pub async fn is_external_session(session: &AuthSession) -> Result<bool> {
    Ok(session.external_identity().await?.is_some())
}
