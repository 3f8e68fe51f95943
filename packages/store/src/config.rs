//! # Blob storage configuration
//!
//! Describes where post images live. Two forms are accepted:
//!
//! - separate account name, base64 account key and container name, or
//! - an Azure connection string such as
//!   `DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...;EndpointSuffix=core.windows.net`
//!   combined with a container name.
//!
//! An explicit `endpoint` (e.g. `http://127.0.0.1:10000/devstoreaccount1`) overrides the
//! endpoint derived from the account name, which is what the storage emulator and the
//! tests use.

use serde::{Deserialize, Serialize};

use crate::blob::BlobError;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Location and credentials of the image container.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobConfig {
    pub account: String,
    /// Base64 encoded shared key of the storage account.
    pub key: String,
    pub container: String,
    /// Service endpoint without trailing slash. Derived from `account` when absent.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("account", &self.account)
            .field("key", &"[redacted]")
            .field("container", &self.container)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl BlobConfig {
    pub fn new(account: impl Into<String>, key: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            key: key.into(),
            container: container.into(),
            endpoint: None,
        }
    }

    /// Override the service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Parse an Azure storage connection string.
    pub fn from_connection_string(connection_string: &str, container: &str) -> Result<Self, BlobError> {
        let mut account = None;
        let mut key = None;
        let mut protocol = "https".to_string();
        let mut suffix = DEFAULT_ENDPOINT_SUFFIX.to_string();
        let mut endpoint = None;

        for part in connection_string.split(';').filter(|p| !p.trim().is_empty()) {
            // Account keys are base64 and may end in '='; split on the first one only.
            let Some((name, value)) = part.split_once('=') else {
                return Err(BlobError::Config("connection string segment without `=`".into()));
            };
            match name.trim() {
                "AccountName" => account = Some(value.trim().to_string()),
                "AccountKey" => key = Some(value.trim().to_string()),
                "DefaultEndpointsProtocol" => protocol = value.trim().to_string(),
                "EndpointSuffix" => suffix = value.trim().to_string(),
                "BlobEndpoint" => endpoint = Some(value.trim().trim_end_matches('/').to_string()),
                _ => {}
            }
        }

        let account = account.ok_or_else(|| BlobError::Config("connection string has no AccountName".into()))?;
        let key = key.ok_or_else(|| BlobError::Config("connection string has no AccountKey".into()))?;
        let endpoint = endpoint.unwrap_or_else(|| format!("{protocol}://{account}.blob.{suffix}"));

        Ok(Self {
            account,
            key,
            container: container.to_string(),
            endpoint: Some(endpoint),
        })
    }

    /// Service endpoint, e.g. `https://acct.blob.core.windows.net`.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.{}", self.account, DEFAULT_ENDPOINT_SUFFIX),
        }
    }

    /// URL prefix of the container, with trailing slash.
    pub fn container_url(&self) -> String {
        format!("{}/{}/", self.endpoint(), self.container)
    }
}
