//! # Application settings
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults (below),
//! 2. an optional `config.toml` in the working directory,
//! 3. environment variables, after loading a `.env` file with `dotenvy`.
//!
//! Environment variable names are the upper-case keys (`CLIENT_ID`, `AUTHORITY`,
//! `REDIRECT_PATH`, ...). `SCOPE` is a comma-separated list.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use store::BlobConfig;

use crate::error::{Error, Result};

/// Upper bound for `SESSION_LIFETIME_DAYS`.
pub const MAX_SESSION_LIFETIME_DAYS: u32 = 3650;

/// Paths the route table already serves; the OAuth callback must not collide with them.
const RESERVED_PATHS: &[&str] = &["/", "/home", "/new_post", "/login", "/logout"];

#[derive(Clone, Deserialize)]
pub struct Settings {
    pub secret_key: String,
    /// External origin of the site, e.g. `https://blog.example.com`.
    pub base_url: String,
    pub bind_address: String,

    pub client_id: String,
    pub client_secret: String,
    pub authority: String,
    pub redirect_path: String,
    pub scope: Vec<String>,
    pub oauth_timeout_secs: u64,

    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,

    pub blob_account: String,
    pub blob_storage_key: String,
    pub blob_container: String,
    #[serde(default)]
    pub blob_connection_string: Option<String>,
    #[serde(default)]
    pub blob_endpoint: Option<String>,

    pub session_lifetime_days: u32,
    pub log_format: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("bind_address", &self.bind_address)
            .field("client_id", &self.client_id)
            .field("authority", &self.authority)
            .field("redirect_path", &self.redirect_path)
            .field("scope", &self.scope)
            .field("database", &self.database_url.as_ref().map(|_| "[configured]"))
            .field("blob_account", &self.blob_account)
            .field("blob_container", &self.blob_container)
            .field("session_lifetime_days", &self.session_lifetime_days)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Load settings from defaults, `config.toml` and the environment.
    pub fn new() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scope"),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder() -> std::result::Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("secret_key", "secret-key")?
            .set_default("base_url", "http://localhost:5555")?
            .set_default("bind_address", "0.0.0.0:5555")?
            .set_default("client_id", "ENTER_CLIENT_ID")?
            .set_default("client_secret", "ENTER_CLIENT_SECRET")?
            .set_default("authority", "https://login.microsoftonline.com/common")?
            .set_default("redirect_path", "/getAToken")?
            .set_default("scope", vec!["User.Read"])?
            .set_default("oauth_timeout_secs", 10)?
            .set_default("blob_account", "ENTER_STORAGE_ACCOUNT_NAME")?
            .set_default("blob_storage_key", "")?
            .set_default("blob_container", "ENTER_IMAGES_CONTAINER_NAME")?
            .set_default("session_lifetime_days", 31)?
            .set_default("log_format", "text")
    }

    /// Settings built from defaults only, ignoring file and environment.
    pub fn defaults() -> Result<Self> {
        Ok(Self::builder()?.build()?.try_deserialize()?)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        validate_redirect_path(&self.redirect_path)?;
        if self.oauth_timeout_secs == 0 {
            return Err(config_error("OAUTH_TIMEOUT_SECS must be greater than zero".into()));
        }
        if !(1..=MAX_SESSION_LIFETIME_DAYS).contains(&self.session_lifetime_days) {
            return Err(config_error(format!(
                "SESSION_LIFETIME_DAYS must be between 1 and {MAX_SESSION_LIFETIME_DAYS}, got {}",
                self.session_lifetime_days
            )));
        }
        Ok(())
    }

    /// Absolute URL of `path` on this site.
    pub fn external_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Image container configuration. A connection string wins over the separate fields.
    pub fn blob(&self) -> Result<BlobConfig> {
        let config = match &self.blob_connection_string {
            Some(conn) if !conn.trim().is_empty() => BlobConfig::from_connection_string(conn, &self.blob_container)?,
            _ => BlobConfig::new(&self.blob_account, &self.blob_storage_key, &self.blob_container),
        };

        Ok(match &self.blob_endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => config.with_endpoint(endpoint.trim()),
            _ => config,
        })
    }
}

fn config_error(message: String) -> Error {
    Error::Config(ConfigError::Message(message))
}

/// The callback path is mounted as a literal route next to the fixed ones.
fn validate_redirect_path(path: &str) -> Result<()> {
    let literal = path.starts_with('/')
        && !path.starts_with("//")
        && path
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '{' | '}' | '*' | '?' | '#' | '\\'));
    if !literal {
        return Err(config_error(format!(
            "REDIRECT_PATH must be a literal absolute path, got `{path}`"
        )));
    }

    let normalized = path.trim_end_matches('/');
    if normalized.is_empty() || RESERVED_PATHS.contains(&normalized) || normalized.starts_with("/post/") {
        return Err(config_error(format!("REDIRECT_PATH `{path}` collides with an application route")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::defaults().unwrap();
        assert_eq!(settings.authority, "https://login.microsoftonline.com/common");
        assert_eq!(settings.redirect_path, "/getAToken");
        assert_eq!(settings.scope, vec!["User.Read".to_string()]);
        assert_eq!(settings.oauth_timeout_secs, 10);
        assert!(settings.database_url.is_none());
    }

    #[test]
    fn test_settings_from_environment() {
        std::env::set_var("CLIENT_ID", "test-client");
        std::env::set_var("REDIRECT_PATH", "/auth/callback");
        std::env::set_var("SCOPE", "User.Read,Mail.Read");

        let settings = Settings::new().unwrap();

        std::env::remove_var("CLIENT_ID");
        std::env::remove_var("REDIRECT_PATH");
        std::env::remove_var("SCOPE");

        assert_eq!(settings.client_id, "test-client");
        assert_eq!(settings.redirect_path, "/auth/callback");
        assert_eq!(settings.scope, vec!["User.Read".to_string(), "Mail.Read".to_string()]);
    }

    #[test]
    fn test_external_url() {
        let mut settings = Settings::defaults().unwrap();
        settings.base_url = "https://blog.example.com/".into();
        assert_eq!(settings.external_url("/getAToken"), "https://blog.example.com/getAToken");
    }

    #[test]
    fn test_blob_from_connection_string() {
        let mut settings = Settings::defaults().unwrap();
        settings.blob_container = "images".into();
        settings.blob_connection_string = Some("AccountName=acct;AccountKey=a2V5".into());

        let blob = settings.blob().unwrap();
        assert_eq!(blob.account, "acct");
        assert_eq!(blob.container_url(), "https://acct.blob.core.windows.net/images/");
    }

    #[test]
    fn test_session_lifetime_bounds() {
        let mut settings = Settings::defaults().unwrap();
        assert!(settings.validate().is_ok());

        for days in [0, MAX_SESSION_LIFETIME_DAYS + 1, u32::MAX] {
            settings.session_lifetime_days = days;
            assert!(matches!(settings.validate(), Err(Error::Config(_))), "{days} accepted");
        }

        settings.session_lifetime_days = MAX_SESSION_LIFETIME_DAYS;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_negative_session_lifetime_is_rejected() {
        let result = Settings::builder()
            .unwrap()
            .set_override("session_lifetime_days", -5)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>();

        assert!(result.is_err());
    }

    #[test]
    fn test_redirect_path_must_be_a_free_literal_route() {
        let mut settings = Settings::defaults().unwrap();
        for path in [
            "getAToken",
            "/",
            "/login",
            "/logout/",
            "/home",
            "/new_post",
            "/post/7",
            "/post/{id}",
            "/auth/{*rest}",
            "//evil",
            "/a b",
        ] {
            settings.redirect_path = path.into();
            assert!(matches!(settings.validate(), Err(Error::Config(_))), "{path} accepted");
        }

        settings.redirect_path = "/auth/callback".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut settings = Settings::defaults().unwrap();
        settings.client_secret = "super-secret-value".into();
        settings.secret_key = "cookie-signing-key".into();

        let printed = format!("{settings:?}");
        assert!(!printed.contains("super-secret-value"));
        assert!(!printed.contains("cookie-signing-key"));
    }
}
