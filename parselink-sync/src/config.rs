//! Server access parameters.
//!
//! A [`ParseConfig`] is built once at startup and shared by `Arc` between
//! the dispatchers. Its fields are private and have no setters, so nothing
//! outside this module can repoint the server or swap the application id:
//!
//! ```compile_fail
//! let mut config = parselink_sync::ParseConfig::default();
//! config.server_url = String::from("http://elsewhere");
//! ```

use crate::error::{SyncError, SyncResult};
use crate::request::{APPLICATION_ID_HEADER, HttpMethod, REST_API_KEY_HEADER, RequestDescriptor};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:1337/parse";
pub const DEFAULT_APP_ID: &str = "myApp";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const SERVER_URL_ENV: &str = "PARSE_SERVER_URL";
pub const APP_ID_ENV: &str = "PARSE_APP_ID";
pub const REST_API_KEY_ENV: &str = "PARSE_REST_API_KEY";

/// Read-only server access parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ConfigFile")]
pub struct ParseConfig {
    server_url: String,
    app_id: String,
    rest_api_key: Option<String>,
    timeout: Duration,
}

/// On-disk shape of the configuration.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    server_url: String,
    app_id: String,
    #[serde(default)]
    rest_api_key: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl TryFrom<ConfigFile> for ParseConfig {
    type Error = SyncError;

    fn try_from(file: ConfigFile) -> SyncResult<Self> {
        let mut config = ParseConfig::new(file.server_url, file.app_id)?;
        if let Some(key) = file.rest_api_key {
            config = config.with_rest_api_key(key);
        }
        if let Some(secs) = file.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

impl ParseConfig {
    /// Creates a configuration. A trailing `/` on the server URL is dropped.
    pub fn new(server_url: impl Into<String>, app_id: impl Into<String>) -> SyncResult<Self> {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        let app_id = app_id.into();

        if server_url.is_empty() {
            return Err(SyncError::Config("server url must not be empty".into()));
        }
        if app_id.is_empty() {
            return Err(SyncError::Config("application id must not be empty".into()));
        }

        Ok(Self {
            server_url,
            app_id,
            rest_api_key: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Reads `PARSE_SERVER_URL`, `PARSE_APP_ID` and `PARSE_REST_API_KEY`,
    /// falling back to the defaults for the first two.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SyncResult<Self> {
        let server_url = lookup(SERVER_URL_ENV).unwrap_or_else(|| DEFAULT_SERVER_URL.into());
        let app_id = lookup(APP_ID_ENV).unwrap_or_else(|| DEFAULT_APP_ID.into());
        let config = Self::new(server_url, app_id)?;
        Ok(match lookup(REST_API_KEY_ENV).filter(|k| !k.is_empty()) {
            Some(key) => config.with_rest_api_key(key),
            None => config,
        })
    }

    /// Sends `X-Parse-REST-API-Key` on every request.
    pub fn with_rest_api_key(mut self, key: impl Into<String>) -> Self {
        self.rest_api_key = Some(key.into());
        self
    }

    /// Sets the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn rest_api_key(&self) -> Option<&str> {
        self.rest_api_key.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts a request at `{server_url}{path}` carrying the application
    /// headers.
    pub fn request(&self, method: HttpMethod, path: &str) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(method, format!("{}{}", self.server_url, path))
            .header(APPLICATION_ID_HEADER, &self.app_id);
        if let Some(key) = &self.rest_api_key {
            request = request.header(REST_API_KEY_HEADER, key);
        }
        request
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            rest_api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
