//! # Authentication
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`local`] | username/password check against the credential store |
//! | [`external`] | Microsoft authorization-code login, mapped to the `admin` account |
//! | [`microsoft`] | stateless provider client (authorization URL, code redemption) |
//! | [`session`] | typed access to the session keys used by both flows |
//! | [`token_cache`] | serializable provider token cache |
//! | [`redirect`] | `next` validation and login URLs |
//! | [`logout`] | principal removal and provider sign-out |

mod config;
pub mod external;
pub mod local;
mod logout;
pub mod microsoft;
mod password;
pub mod redirect;
pub mod session;
pub mod token_cache;

use crate::models::User;

pub use config::{OAuthConfig, RESERVED_SCOPES};
pub use external::{begin_external_login, handle_callback, is_external_session, CallbackParams};
pub use local::authenticate;
pub use logout::logout;
pub use microsoft::{IdTokenClaims, MicrosoftOAuth};
pub use password::{hash_password, verify_password};
pub use redirect::{login_url, safe_next, HOME_PATH, LOGIN_PATH};
pub use session::{AuthSession, Flash};
pub use token_cache::TokenCache;

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    Success(User),
    InvalidCredentials,
    ProviderError(String),
    StateMismatch,
}
