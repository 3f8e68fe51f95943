//! Session guard for the protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

use api::auth::{login_url, AuthSession};

use crate::context::{current_user, CurrentUser};
use crate::error::Result;
use crate::state::AppState;
use crate::views::found;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// Admit requests whose session carries a principal; send everyone else to the login
/// page with the requested path and query as `next`.
pub async fn require_login(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let session = AuthSession::new(session);

    if let Some(user) = current_user(&state, &session).await? {
        request.extensions_mut().insert(CurrentUser(user));
        return Ok(next.run(request).await);
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    session.push_flash("info", LOGIN_REQUIRED_MESSAGE).await?;
    Ok(found(&login_url(&target)))
}
