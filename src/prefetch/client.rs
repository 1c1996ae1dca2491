//! Requests the queue makes against the application's own routes.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::error::PrefetchError;
use super::key::ContentKey;
use crate::http_client::{ReqwestTransport, Transport};

/// Header marking a request as speculative so handlers can skip side effects.
pub const PREFETCH_HEADER: (&str, &str) = ("X-Prefetch", "true");

/// Default number of related items requested per warm-up.
pub const DEFAULT_RELATED_LIMIT: u32 = 6;

/// Warms one item. A single attempt per call; the queue owns failure policy.
#[async_trait]
pub trait PrefetchClient: Send + Sync + 'static {
    /// Warm the detail cache for `key`.
    async fn fetch_detail(&self, key: ContentKey) -> Result<(), PrefetchError>;

    /// Warm the related-content cache for `key`.
    async fn fetch_related(&self, key: ContentKey) -> Result<(), PrefetchError>;
}

/// [`PrefetchClient`] that GETs the detail and related routes under a base URL.
pub struct HttpPrefetchClient<T = ReqwestTransport> {
    transport: T,
    base_url: Url,
    timeout: Duration,
    related_limit: u32,
}

impl HttpPrefetchClient<ReqwestTransport> {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, PrefetchError> {
        Self::with_transport(
            ReqwestTransport::new(user_agent_config, timeout),
            base_url,
            timeout,
        )
    }
}

impl<T: Transport> HttpPrefetchClient<T> {
    pub fn with_transport(
        transport: T,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PrefetchError> {
        Ok(Self {
            transport,
            base_url: normalize_base_url(base_url)?,
            timeout,
            related_limit: DEFAULT_RELATED_LIMIT,
        })
    }

    pub fn with_related_limit(mut self, limit: u32) -> Self {
        self.related_limit = limit;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `/api/movies/{id}` or `/api/tv/{id}`.
    pub fn detail_url(&self, key: ContentKey) -> Result<Url, PrefetchError> {
        let path = format!("api/{}/{}", key.content_type.detail_segment(), key.id);
        Ok(self.base_url.join(&path)?)
    }

    /// `/api/content/{type}/{id}/related?type=similar&limit=N`.
    pub fn related_url(&self, key: ContentKey) -> Result<Url, PrefetchError> {
        let path = format!("api/content/{}/{}/related", key.content_type, key.id);
        let mut url = self.base_url.join(&path)?;
        url.query_pairs_mut()
            .append_pair("type", "similar")
            .append_pair("limit", &self.related_limit.to_string());
        Ok(url)
    }

    async fn warm(&self, key: ContentKey, url: Url) -> Result<(), PrefetchError> {
        match tokio::time::timeout(
            self.timeout,
            self.transport.get(url.as_str(), &[PREFETCH_HEADER]),
        )
        .await
        {
            Err(_) => Err(PrefetchError::Timeout {
                key,
                timeout: self.timeout,
            }),
            Ok(Err(source)) => Err(PrefetchError::Transport { key, source }),
            Ok(Ok(response)) if response.is_success() => Ok(()),
            Ok(Ok(response)) => Err(PrefetchError::Status {
                key,
                status: response.status,
            }),
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> PrefetchClient for HttpPrefetchClient<T> {
    async fn fetch_detail(&self, key: ContentKey) -> Result<(), PrefetchError> {
        let url = self.detail_url(key)?;
        self.warm(key, url).await
    }

    async fn fetch_related(&self, key: ContentKey) -> Result<(), PrefetchError> {
        let url = self.related_url(key)?;
        self.warm(key, url).await
    }
}

/// Require http(s) and a trailing slash so joins append instead of replace.
fn normalize_base_url(base_url: &str) -> Result<Url, PrefetchError> {
    let mut url = Url::parse(base_url.trim())?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(PrefetchError::InvalidBaseUrl(base_url.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpPrefetchClient {
        HttpPrefetchClient::new(base, Duration::from_secs(10), None).unwrap()
    }

    #[test]
    fn test_detail_urls() {
        let c = client("http://localhost:3000");
        assert_eq!(
            c.detail_url(ContentKey::movie(10)).unwrap().as_str(),
            "http://localhost:3000/api/movies/10"
        );
        assert_eq!(
            c.detail_url(ContentKey::tv(12)).unwrap().as_str(),
            "http://localhost:3000/api/tv/12"
        );
    }

    #[test]
    fn test_related_url_has_query() {
        let c = client("http://localhost:3000/");
        assert_eq!(
            c.related_url(ContentKey::tv(4)).unwrap().as_str(),
            "http://localhost:3000/api/content/tv/4/related?type=similar&limit=6"
        );
    }

    #[test]
    fn test_base_path_is_preserved() {
        let c = client("https://example.com/app").with_related_limit(3);
        assert_eq!(c.base_url().as_str(), "https://example.com/app/");
        assert_eq!(
            c.related_url(ContentKey::movie(1)).unwrap().as_str(),
            "https://example.com/app/api/content/movie/1/related?type=similar&limit=3"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(HttpPrefetchClient::new("ftp://example.com", Duration::from_secs(1), None).is_err());
        assert!(HttpPrefetchClient::new("not a url", Duration::from_secs(1), None).is_err());
    }
}
