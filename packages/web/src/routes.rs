//! Route table.
//!
//! | Method | Path | Guarded | Handler |
//! |--------|------|---------|---------|
//! | GET | `/`, `/home` | yes | [`posts::home`] |
//! | GET, POST | `/new_post` | yes | [`posts::new_post_form`], [`posts::create_post`] |
//! | GET, POST | `/post/{id}` | yes | [`posts::edit_post_form`], [`posts::update_post`] |
//! | GET, POST | `/login` | no | [`auth::login_page`], [`auth::login_submit`] |
//! | GET | `REDIRECT_PATH` | no | [`auth::authorized`] |
//! | GET | `/logout` | no | [`auth::logout`] |

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use sha2::{Digest, Sha512};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::guard::require_login;
use crate::state::AppState;
use crate::views::{auth, posts};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(posts::home))
        .route("/home", get(posts::home))
        .route("/new_post", get(posts::new_post_form).post(posts::create_post))
        .route("/post/{id}", get(posts::edit_post_form).post(posts::update_post))
        .layer(DefaultBodyLimit::max(posts::MAX_UPLOAD_BYTES))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let public = Router::new()
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route(&state.settings.redirect_path, get(auth::authorized))
        .route("/logout", get(auth::logout));

    protected.merge(public).with_state(state)
}

/// The full application: routes, signed session cookies and request tracing.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    // cookie::Key needs 64 bytes
    let key = Key::from(&Sha512::digest(state.settings.secret_key.as_bytes())[..]);

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.settings.base_url.starts_with("https://"))
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnSessionEnd)
        .with_signed(key);

    router(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
