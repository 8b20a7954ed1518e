//! WPVulnDB API client
//!
//! One HTTP client is built per run and reused for every item query.

use crate::config::DEFAULT_API_BASE;
use crate::error::{Error, Result};
use crate::response::{ItemData, VulnResponse};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// User agent for API requests
const USER_AGENT: &str = concat!("wpvulndb-report/", env!("CARGO_PKG_VERSION"));

/// Request timeout in seconds
const TIMEOUT_SECS: u64 = 30;

/// Categories that refer to WordPress core itself
const CORE_CATEGORIES: &[&str] = &["core", "wordpress", "wordpresses"];

/// API path and item label used for core queries
const CORE_API_PATH: &str = "wordpresses";
const CORE_ITEM: &str = "wordpress";

/// Allowed URL schemes for the API base
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Client for the vulnerability database
#[derive(Debug)]
pub struct VulnDbClient {
    client: Client,
    api_base: Url,
}

/// Builder for configuring a VulnDbClient
#[derive(Debug)]
pub struct VulnDbClientBuilder {
    token: String,
    api_base: String,
    debug: bool,
}

impl VulnDbClientBuilder {
    /// Create a new builder authenticating with `token`
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            debug: false,
        }
    }

    /// Use a different API base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Log connection-level details of every request
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<VulnDbClient> {
        let api_base = Url::parse(&self.api_base).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if !ALLOWED_SCHEMES.contains(&api_base.scheme()) || api_base.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!(
                "'{}' is not an http(s) base URL",
                self.api_base
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Token token={}", self.token))
            .map_err(|e| Error::HttpClient(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .connection_verbose(self.debug)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(VulnDbClient { client, api_base })
    }
}

impl VulnDbClient {
    /// Create a client for the default API base
    pub fn new(token: &str) -> Result<Self> {
        VulnDbClientBuilder::new(token).build()
    }

    /// Create a builder for configuring client options
    pub fn builder(token: &str) -> VulnDbClientBuilder {
        VulnDbClientBuilder::new(token)
    }

    /// Query the database for `item` at `version` in `category`
    ///
    /// For core categories (`core`, `wordpress`, `wordpresses`) `item` is the
    /// installed core version and `version` is ignored. Failures never
    /// escape: they end up in [`VulnResponse::error`].
    pub async fn request(&self, category: &str, item: &str, version: &str) -> VulnResponse {
        let category = category.trim();
        let item = item.trim();
        let version = version.trim();

        let (api_path, api_id, response) = if CORE_CATEGORIES.contains(&category) {
            (
                CORE_API_PATH,
                item.replace('.', ""),
                VulnResponse::new(CORE_ITEM, item),
            )
        } else {
            (category, item.to_string(), VulnResponse::new(item, version))
        };

        let url = self.endpoint(api_path, &api_id);
        debug!(%url, "querying vulnerability database");

        let http_response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return response.with_error(e.to_string()),
        };
        let status = http_response.status();
        let body = match http_response.text().await {
            Ok(body) => body,
            Err(e) => return response.with_error(e.to_string()),
        };
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        interpret(response, item, &body)
    }

    fn endpoint(&self, api_path: &str, api_id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(api_path).push(api_id);
        }
        url
    }
}

/// Map a response body onto `response`
///
/// The API nests per-item data under the queried name (the plugin slug, or
/// the dotted version for core). Bodies of the form `{"error": ...}` become
/// the item's status; anything else is kept verbatim as the error.
fn interpret(response: VulnResponse, key: &str, body: &str) -> VulnResponse {
    let Ok(Value::Object(mut data)) = serde_json::from_str::<Value>(body) else {
        return response.with_error(body);
    };

    if let Some(item) = data.remove(key) {
        match serde_json::from_value::<ItemData>(item) {
            Ok(item) => response.load(item),
            Err(e) => response.with_error(format!("unexpected data for {key}: {e}")),
        }
    } else if let Some(error) = data.get("error") {
        let status = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        response.with_status(status)
    } else {
        response.with_error(body)
    }
}
