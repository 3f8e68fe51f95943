//! # Azure Blob Storage backend
//!
//! Talks to the Blob service REST API directly with `reqwest`, authorising every call
//! with the storage account's Shared Key:
//!
//! 1. build the canonical *string-to-sign* from the verb, the standard headers, the
//!    sorted `x-ms-*` headers and the canonicalised resource (`/<account><path>`),
//! 2. HMAC-SHA256 it with the base64-decoded account key,
//! 3. send `Authorization: SharedKey <account>:<base64 signature>`.
//!
//! Only the two operations post images need are implemented: `Put Blob` (block blob)
//! and `Delete Blob`.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode};
use sha2::Sha256;
use url::Url;

use crate::blob::{BlobError, BlobStore};
use crate::config::BlobConfig;

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2021-08-06";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`BlobStore`] backed by an Azure storage container.
pub struct AzureBlobStore {
    config: BlobConfig,
    key: Vec<u8>,
    http: reqwest::Client,
}

impl AzureBlobStore {
    pub fn new(config: BlobConfig) -> Result<Self, BlobError> {
        let key = STANDARD
            .decode(config.key.trim())
            .map_err(|_| BlobError::Config("account key is not valid base64".into()))?;
        Url::parse(&config.endpoint()).map_err(|e| BlobError::Config(format!("invalid endpoint: {e}")))?;

        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { config, key, http })
    }

    fn blob_url(&self, name: &str) -> Result<Url, BlobError> {
        let mut url = Url::parse(&self.config.endpoint()).map_err(|e| BlobError::Config(format!("invalid endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BlobError::Config("endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .push(&self.config.container)
            .push(name);
        Ok(url)
    }

    fn authorization(&self, method: &Method, url: &Url, content_length: usize, content_type: &str, ms_headers: &[(&str, &str)]) -> Result<String, BlobError> {
        let resource = format!("/{}{}", self.config.account, url.path());
        let to_sign = string_to_sign(method.as_str(), content_length, content_type, ms_headers, &resource);
        Ok(format!("SharedKey {}:{}", self.config.account, sign(&self.key, &to_sign)?))
    }

    async fn send(&self, method: Method, name: &str, content_type: &str, body: Vec<u8>, extra: &[(&str, &str)]) -> Result<StatusCode, BlobError> {
        let url = self.blob_url(name)?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let mut ms_headers: Vec<(&str, &str)> = extra.to_vec();
        ms_headers.push(("x-ms-date", &date));
        ms_headers.push(("x-ms-version", API_VERSION));
        ms_headers.sort_by(|a, b| a.0.cmp(b.0));

        let authorization = self.authorization(&method, &url, body.len(), content_type, &ms_headers)?;

        let mut request = self.http.request(method, url).header("Authorization", authorization);
        for (name, value) in &ms_headers {
            request = request.header(*name, *value);
        }
        if !content_type.is_empty() {
            request = request.header("Content-Type", content_type);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        Ok(request.send().await?.status())
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn put(&self, name: &str, content_type: &str, data: Vec<u8>) -> Result<(), BlobError> {
        let status = self
            .send(Method::PUT, name, content_type, data, &[("x-ms-blob-type", "BlockBlob")])
            .await?;

        if status.is_success() {
            tracing::debug!(blob = name, "uploaded blob");
            Ok(())
        } else {
            Err(BlobError::Status {
                status: status.as_u16(),
                name: name.to_string(),
            })
        }
    }

    async fn delete(&self, name: &str) -> Result<(), BlobError> {
        let status = self.send(Method::DELETE, name, "", Vec::new(), &[]).await?;

        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::debug!(blob = name, "deleted blob");
            Ok(())
        } else {
            Err(BlobError::Status {
                status: status.as_u16(),
                name: name.to_string(),
            })
        }
    }

    fn public_base_url(&self) -> String {
        self.config.container_url()
    }
}

/// Shared Key string-to-sign. `ms_headers` must already be sorted by name.
fn string_to_sign(verb: &str, content_length: usize, content_type: &str, ms_headers: &[(&str, &str)], resource: &str) -> String {
    // Zero length is signed as an empty string since API version 2015-02-21.
    let content_length = if content_length == 0 { String::new() } else { content_length.to_string() };

    let canonical_headers: String = ms_headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name.to_ascii_lowercase(), value.trim()))
        .collect();

    format!(
        "{verb}\n\n\n{content_length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{resource}"
    )
}

fn sign(key: &[u8], to_sign: &str) -> Result<String, BlobError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| BlobError::Config(format!("unusable account key: {e}")))?;
    mac.update(to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> AzureBlobStore {
        let config = BlobConfig::new("acct", "a2V5", "images").with_endpoint(server.uri());
        AzureBlobStore::new(config).unwrap()
    }

    #[test]
    fn test_string_to_sign_layout() {
        let to_sign = string_to_sign(
            "PUT",
            3,
            "image/png",
            &[("x-ms-blob-type", "BlockBlob"), ("x-ms-date", "Mon, 01 Jan 2024 00:00:00 GMT"), ("x-ms-version", API_VERSION)],
            "/acct/images/a.png",
        );

        assert_eq!(
            to_sign,
            "PUT\n\n\n3\n\nimage/png\n\n\n\n\n\n\nx-ms-blob-type:BlockBlob\nx-ms-date:Mon, 01 Jan 2024 00:00:00 GMT\nx-ms-version:2021-08-06\n/acct/images/a.png"
        );
    }

    #[test]
    fn test_empty_body_signs_empty_length() {
        let to_sign = string_to_sign("DELETE", 0, "", &[], "/acct/images/a.png");
        assert_eq!(to_sign, "DELETE\n\n\n\n\n\n\n\n\n\n\n\n/acct/images/a.png");
    }

    #[test]
    fn test_sign_known_vector() {
        // HMAC-SHA256(key = "key", "The quick brown fox jumps over the lazy dog")
        let signature = sign(b"key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(signature, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn test_rejects_non_base64_key() {
        let config = BlobConfig::new("acct", "not base64!!", "images");
        assert!(matches!(AzureBlobStore::new(config), Err(BlobError::Config(_))));
    }

    #[tokio::test]
    async fn test_put_blob_sends_signed_request() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/images/cat.png"))
            .and(header("x-ms-blob-type", "BlockBlob"))
            .and(header("x-ms-version", API_VERSION))
            .and(header("content-type", "image/png"))
            .and(header_exists("x-ms-date"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.put("cat.png", "image/png", vec![1, 2, 3]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
        assert!(authorization.starts_with("SharedKey acct:"));
    }

    #[tokio::test]
    async fn test_put_blob_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = store.put("cat.png", "image/png", vec![1]).await.unwrap_err();
        assert!(matches!(err, BlobError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_blob_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/images/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.delete("gone.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_public_base_url() {
        let server = MockServer::start().await;
        let store = store_for(&server);
        assert_eq!(store.public_base_url(), format!("{}/images/", server.uri()));
    }
}
