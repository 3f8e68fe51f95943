//! Logout.

use super::external::is_external_session;
use super::microsoft::MicrosoftOAuth;
use super::redirect::LOGIN_PATH;
use super::session::AuthSession;
use crate::error::Result;

/// Log the session out and return where to send the browser.
///
/// The principal is always removed. A session that came from a Microsoft login is
/// flushed entirely and the browser goes through the provider's sign-out page, which
/// returns it to `post_logout_redirect` (the absolute login URL). Otherwise the browser
/// goes straight to the login page.
pub async fn logout(oauth: &MicrosoftOAuth, session: &AuthSession, post_logout_redirect: &str) -> Result<String> {
    let external = is_external_session(session).await?;
    session.clear_principal().await?;

    if external {
        session.flush().await?;
        tracing::info!("logged out external session");
        return Ok(oauth.logout_url(post_logout_redirect).to_string());
    }

    tracing::info!("logged out");
    Ok(LOGIN_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::microsoft::tests::oauth_for;
    use crate::auth::microsoft::IdTokenClaims;
    use crate::auth::session::tests::auth_session;
    use crate::models::User;
    use wiremock::MockServer;

    fn admin() -> User {
        User {
            id: 1,
            username: "admin".into(),
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_local_logout_keeps_other_session_data() {
        let server = MockServer::start().await;
        let oauth = oauth_for(&server);
        let session = auth_session();
        session.login(&admin(), None).await.unwrap();
        session.push_flash("info", "kept").await.unwrap();

        let target = logout(&oauth, &session, "http://localhost:5555/login").await.unwrap();

        assert_eq!(target, "/login");
        assert_eq!(session.principal().await.unwrap(), None);
        assert_eq!(session.take_flashes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_external_logout_clears_session() {
        let server = MockServer::start().await;
        let oauth = oauth_for(&server);
        let session = auth_session();
        session.login(&admin(), None).await.unwrap();
        session
            .set_external_identity(&IdTokenClaims {
                name: Some("Ada".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let target = logout(&oauth, &session, "http://localhost:5555/login").await.unwrap();

        assert!(target.starts_with(&format!("{}/tenant/oauth2/v2.0/logout?", server.uri())));
        assert!(target.contains("post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A5555%2Flogin"));
        assert_eq!(session.principal().await.unwrap(), None);
        assert_eq!(session.external_identity().await.unwrap(), None);
    }
}
