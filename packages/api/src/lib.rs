//! # API crate — domain logic for the blog
//!
//! Everything the web server needs that is not HTTP: models, stores, the login flows
//! and post saving. Handlers in the `web` crate pass the stores, the OAuth client and the
//! session into these functions explicitly.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | local and Microsoft login, session bookkeeping, safe redirects, logout |
//! | [`db`] | credential and post stores (PostgreSQL and in-memory) and migrations |
//! | [`error`] | crate error type |
//! | [`models`] | `User`, `Post` and the post form payload |
//! | [`posts`] | saving posts with optional image upload |
//! | [`settings`] | layered configuration (defaults, `config.toml`, environment) |

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod posts;
pub mod settings;

pub use error::{Error, Result};
pub use models::{Post, PostInput, User, UserInfo};
pub use settings::Settings;
