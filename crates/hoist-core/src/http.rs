//! Shared HTTP client setup for the remote backends.

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};

const USER_AGENT: &str = concat!("hoist/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "Api-Key";

/// Build a client with the hoist user agent and, if given, the API key header.
pub fn build_client(api_key: Option<&str>) -> anyhow::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(key).context("API key is not a valid header value")?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}

/// Join `path` onto `base`, tolerating a missing trailing slash on `base`.
pub fn join_url(base: &url::Url, path: &str) -> anyhow::Result<url::Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .with_context(|| format!("Failed to build URL from {} and {}", base, path))
}
