//! # Database module: user and post persistence
//!
//! The application talks to storage only through the [`CredentialStore`] and
//! [`PostStore`] traits so handlers can run against either backend:
//!
//! - [`PgStore`]: PostgreSQL via SQLx. [`connect`] opens the pool (up to 5 connections)
//!   and [`migrate`] applies the embedded migrations in `packages/api/migrations`.
//! - [`MemoryStore`]: a mutex-guarded in-memory copy of both tables, used by the tests
//!   and when no `DATABASE_URL` is configured.

mod memory;
mod pool;
mod postgres;
mod stores;

pub use memory::MemoryStore;
pub use pool::{connect, migrate};
pub use postgres::PgStore;
pub use stores::{CredentialStore, PostStore};
