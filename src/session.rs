//! The cache-wrapped GET session shared by both provider clients.
//!
//! A [`CachedSession`] owns an [`HttpCache`] and a [`Transport`]. Every GET
//! first consults the cache under a canonical key (method, URL, sorted query
//! parameters); on a miss it performs the network call and persists eligible
//! responses. A transport failure is surfaced as-is — a stale entry is never
//! substituted for a failed fetch.

use crate::cache::{CacheError, HttpCache};
use crate::config::{Config, HttpSettings};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid request URL `{url}`: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// What a provider client sees for one GET: the final URL, the status, the
/// undecoded body, and whether the cache answered.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
    pub from_cache: bool,
}

/// A network response before cache processing.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub cache_control: Option<String>,
    pub body: String,
}

/// The network seam. Implemented by [`ReqwestTransport`] in production and by
/// counting fakes in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> anyhow::Result<TransportResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(std::time::Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self { client })
    }

    /// Reuses an already-configured client, allowing connection pooling
    /// across sessions.
    #[must_use]
    pub const fn with_shared_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> anyhow::Result<TransportResponse> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let cache_control = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            cache_control,
            body,
        })
    }
}

pub struct CachedSession {
    transport: Arc<dyn Transport>,
    cache: HttpCache,
}

impl CachedSession {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: HttpCache) -> Self {
        Self { transport, cache }
    }

    /// Builds a session for one provider using the configured cache root and
    /// HTTP settings. Each provider keeps its own cache subdirectory.
    pub fn from_config(config: &Config, provider: &str) -> anyhow::Result<Self> {
        let cache = HttpCache::new(
            config.cache.provider_dir(provider),
            config.cache.retention(),
            config.cache.respect_cache_control,
        );
        let transport = ReqwestTransport::new(&config.http)?;

        Ok(Self::new(Arc::new(transport), cache))
    }

    /// Performs a GET for `url` with `params` appended, replaying a fresh
    /// cached response when one exists.
    ///
    /// Callers omit unset parameters entirely; they never reach the cache
    /// key or the wire. Non-200 responses are returned for inspection and
    /// never cached.
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<RawResponse, SessionError> {
        let request_url = build_url(url, params)?;
        let key = cache_key(&request_url);

        if let Some(entry) = self.cache.lookup(&key) {
            return Ok(RawResponse {
                url: entry.url,
                status: entry.status,
                body: entry.body,
                from_cache: true,
            });
        }

        let response = self
            .transport
            .get(&request_url)
            .await
            .map_err(SessionError::Transport)?;

        self.cache.store(
            &key,
            request_url.as_str(),
            response.status,
            response.cache_control.as_deref(),
            &response.body,
        )?;

        Ok(RawResponse {
            url: request_url.into(),
            status: response.status,
            body: response.body,
            from_cache: false,
        })
    }
}

fn build_url(url: &str, params: &[(&str, String)]) -> Result<Url, SessionError> {
    let mut parsed = Url::parse(url).map_err(|source| SessionError::Url {
        url: url.to_string(),
        source,
    })?;

    if !params.is_empty() {
        let mut pairs = parsed.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }

    Ok(parsed)
}

/// Canonical cache key: method, then the URL with its query parameters in
/// sorted order, so parameter ordering never splits the cache.
fn cache_key(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    pairs.sort();

    let mut base = url.clone();
    base.set_query(None);

    let mut key = format!("GET|{base}");
    for (name, value) in pairs {
        key.push('|');
        key.push_str(&name);
        key.push('=');
        key.push_str(&value);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_insensitive_to_parameter_order() {
        let a = build_url("https://x.test/q", &[("a", "1".into()), ("b", "2".into())]).unwrap();
        let b = build_url("https://x.test/q", &[("b", "2".into()), ("a", "1".into())]).unwrap();
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn key_includes_parameters_embedded_in_the_url() {
        let bare = build_url("https://x.test/q", &[]).unwrap();
        let paged = build_url("https://x.test/q?page=2", &[]).unwrap();
        let appended = build_url("https://x.test/q", &[("page", "2".into())]).unwrap();

        assert_ne!(cache_key(&bare), cache_key(&paged));
        assert_eq!(cache_key(&paged), cache_key(&appended));
    }

    #[test]
    fn omitted_parameters_never_reach_the_url() {
        let url = build_url("https://x.test/q", &[("q", "bolt".into())]).unwrap();
        assert_eq!(url.as_str(), "https://x.test/q?q=bolt");
    }
}
