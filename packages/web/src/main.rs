use std::sync::Arc;

use anyhow::Context;
use api::auth::hash_password;
use api::db::{MemoryStore, PgStore};
use api::models::ADMIN_USERNAME;
use api::Settings;
use store::{AzureBlobStore, BlobStore, MemoryBlobStore};
use tower_sessions::MemoryStore as MemorySessionStore;
use tower_sessions_sqlx_store::PostgresStore;

mod context;
mod error;
mod guard;
mod routes;
mod state;
mod telemetry;
mod templates;
mod views;


use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new()?;
    telemetry::init(&settings.log_format)?;
    tracing::debug!(?settings, "Loaded settings");

    let blobs = blob_store(&settings)?;
    let bind_address = settings.bind_address.clone();

    let app = match settings.database_url.clone() {
        Some(database_url) => {
            let pool = api::db::connect(&database_url)
                .await
                .context("Failed to connect to database")?;
            api::db::migrate(&pool).await.context("Failed to run migrations")?;

            let session_store = PostgresStore::new(pool.clone());
            session_store
                .migrate()
                .await
                .context("Failed to create session table")?;

            let db = Arc::new(PgStore::new(pool));
            let state = AppState::new(settings, db.clone(), db, blobs)?;
            routes::app(state, session_store)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using in-memory storage");
            let db = Arc::new(MemoryStore::new());
            match &settings.admin_password {
                Some(password) => {
                    db.add_user(ADMIN_USERNAME, &hash_password(password)?);
                }
                None => tracing::warn!("ADMIN_PASSWORD is not set, no account can log in"),
            }
            let state = AppState::new(settings, db.clone(), db, blobs)?;
            routes::app(state, MemorySessionStore::default())
        }
    };

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on {}", bind_address);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Azure storage when credentials are configured, otherwise an in-memory container.
fn blob_store(settings: &Settings) -> anyhow::Result<Arc<dyn BlobStore>> {
    let has_credentials = settings
        .blob_connection_string
        .as_deref()
        .is_some_and(|conn| !conn.trim().is_empty())
        || !settings.blob_storage_key.trim().is_empty();

    if !has_credentials {
        tracing::warn!("No blob storage credentials configured, images are kept in memory");
        return Ok(Arc::new(MemoryBlobStore::new()));
    }

    Ok(Arc::new(AzureBlobStore::new(settings.blob()?)?))
}
