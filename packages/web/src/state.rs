use std::sync::Arc;

use api::auth::{MicrosoftOAuth, OAuthConfig};
use api::db::{CredentialStore, PostStore};
use api::Settings;
use store::BlobStore;

use crate::templates::Templates;

/// Shared handles every handler receives through [`RequestContext`](crate::context::RequestContext).
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub users: Arc<dyn CredentialStore>,
    pub posts: Arc<dyn PostStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub oauth: Arc<MicrosoftOAuth>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        users: Arc<dyn CredentialStore>,
        posts: Arc<dyn PostStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> anyhow::Result<Self> {
        settings.validate()?;
        let oauth = MicrosoftOAuth::new(OAuthConfig::microsoft(&settings)?);

        Ok(Self {
            settings: Arc::new(settings),
            users,
            posts,
            blobs,
            oauth: Arc::new(oauth),
            templates: Arc::new(Templates::new()?),
        })
    }
}
