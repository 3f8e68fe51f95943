//! Request-scoped context.
//!
//! Handlers take a [`RequestContext`] instead of reaching for globals: it bundles the
//! shared [`AppState`], the caller's session and the logged-in user, if any.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Html;
use minijinja::{context, Value};
use tower_sessions::Session;

use api::auth::AuthSession;
use api::User;

use crate::error::{template_error, AppError, Result};
use crate::state::AppState;

/// The user resolved by the session guard for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub struct RequestContext {
    pub state: AppState,
    pub session: AuthSession,
    pub user: Option<User>,
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| {
                AppError(api::Error::Internal {
                    operation: format!("load session: {message}"),
                })
            })?;
        let session = AuthSession::new(session);

        let user = match parts.extensions.get::<CurrentUser>() {
            Some(CurrentUser(user)) => Some(user.clone()),
            None => current_user(state, &session).await?,
        };

        Ok(Self {
            state: state.clone(),
            session,
            user,
        })
    }
}

/// Resolve the session's principal to a user record. A principal whose user no longer
/// exists is removed from the session.
pub async fn current_user(state: &AppState, session: &AuthSession) -> Result<Option<User>> {
    let Some(user_id) = session.principal().await? else {
        return Ok(None);
    };

    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(Some(user)),
        None => {
            tracing::warn!(user_id, "session refers to a missing user");
            session.clear_principal().await?;
            Ok(None)
        }
    }
}

impl RequestContext {
    /// Render `template` with `page`, adding the current user and the pending flashes.
    pub async fn render(&self, template: &str, page: Value) -> Result<Html<String>> {
        let flashes = self.session.take_flashes().await?;
        let ctx = context! {
            current_user => self.user.as_ref().map(User::to_info),
            flashes => flashes,
            ..page
        };

        self.state
            .templates
            .render(template, ctx)
            .map(Html)
            .map_err(template_error)
    }

    pub fn user_id(&self) -> Result<i64> {
        self.user.as_ref().map(|user| user.id).ok_or_else(|| {
            AppError(api::Error::Internal {
                operation: "resolve the logged-in user".into(),
            })
        })
    }
}
